//! Convert command - unit conversion helper.

use clap::Args;
use rust_decimal::Decimal;
use std::str::FromStr;

use larder_core::{convert_units, parse_pack_size, UnitType};

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Quantity to convert
    quantity: String,

    /// Source unit (e.g. LB, OZ, GAL)
    from: String,

    /// Target unit
    to: String,

    /// Treat the quantity as a pack-size string and convert its total
    /// (e.g. "2/5" with LB converts 10 LB)
    #[arg(long)]
    pack: bool,
}

pub async fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let from = UnitType::from_str_loose(&args.from);
    let to = UnitType::from_str_loose(&args.to);

    let quantity = if args.pack {
        let pack = parse_pack_size(&format!("{} {}", args.quantity, args.from));
        pack.units_per_case * pack.size_per_unit
    } else {
        Decimal::from_str(&args.quantity)
            .map_err(|_| anyhow::anyhow!("Invalid quantity: {}", args.quantity))?
    };

    let converted = convert_units(&from, &to, quantity)?;
    println!("{} {} = {} {}", quantity, from, converted, to);

    Ok(())
}
