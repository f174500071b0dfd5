use anyhow::{Context, Result};
use catalog_core::{evaluate, FieldRegistry, Operator, Product, PRODUCT_FIELDS};
use catalog_storage::load_products;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about="Catalog admin CLI", long_about=None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run segment rules against the products stored in a data dir.
    Evaluate {
        #[arg(long)]
        data_dir: PathBuf,
        rules: Vec<String>,
    },
    /// List filterable fields and the accepted operators.
    Fields,
    /// Write every stored product as JSON lines.
    Dump {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn load(data_dir: &Path) -> Result<Vec<Product>> {
    load_products(data_dir).with_context(|| format!("reading {}", data_dir.display()))
}

fn segment(products: Vec<Product>, rules: &[String], registry: &FieldRegistry) -> Result<Vec<Product>> {
    let predicate = evaluate(rules, registry)?;
    Ok(products.into_iter().filter(|p| predicate.matches(p)).collect())
}

fn fields_report(registry: &FieldRegistry) -> serde_json::Value {
    let operators: Vec<&str> = Operator::ALL.iter().map(Operator::symbol).collect();
    serde_json::json!({ "fields": registry, "operators": operators })
}

fn json_lines(products: &[Product]) -> Result<String> {
    let mut s = String::new();
    for p in products {
        s.push_str(&serde_json::to_string(p)?);
        s.push('\n');
    }
    Ok(s)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Evaluate { data_dir, rules } => {
            let matched = segment(load(&data_dir)?, &rules, &PRODUCT_FIELDS)?;
            let report = serde_json::json!({ "matched": matched.len(), "data": matched });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Cmd::Fields => {
            println!("{}", serde_json::to_string_pretty(&fields_report(&PRODUCT_FIELDS))?);
        }
        Cmd::Dump { data_dir, out } => {
            let products = load(&data_dir)?;
            let s = json_lines(&products)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, s)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("dumped {} products to {}", products.len(), path.display());
                }
                None => print!("{}", s),
            }
        }
    }
    Ok(())
}
