use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use smellsplit_core::labels::LabelHierarchy;
use smellsplit_core::store::LabelStore;

#[derive(Args, Debug)]
pub struct LabelsArgs {
    /// Repository identifier in the label store
    pub solution_id: String,

    /// Smell name, e.g. "Magic Number"
    pub smell: String,

    /// Config file (default: ./smellsplit.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Label database, overriding `store.path`
    #[arg(long, env = "SMELLSPLIT_DB")]
    pub db: Option<PathBuf>,

    /// Print the hierarchy as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: LabelsArgs) -> anyhow::Result<()> {
    let db_path = match args.db {
        Some(p) => p,
        None => super::load_config(args.config.as_deref())?.store.path,
    };
    let store = super::open_store(&db_path)?;

    let hierarchy = store
        .fetch_labels(&args.solution_id, &args.smell)
        .await
        .with_context(|| format!("Cannot read labels for {}", args.solution_id))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hierarchy)?);
        return Ok(());
    }

    let kind = hierarchy
        .kind()
        .map_or_else(|| "no labels".to_string(), |k| k.to_string());
    println!(
        "{} in {}: {kind}, {} positive",
        args.smell,
        args.solution_id,
        hierarchy.positive_count()
    );
    match &hierarchy {
        LabelHierarchy::Empty => {}
        LabelHierarchy::Design(components) => {
            for (component, classes) in components {
                println!("  {component}");
                for class_name in classes {
                    println!("    {class_name}");
                }
            }
        }
        LabelHierarchy::Implementation(components) => {
            for (component, classes) in components {
                println!("  {component}");
                for (class_name, methods) in classes {
                    println!("    {class_name}");
                    for method in methods {
                        println!("      {method}");
                    }
                }
            }
        }
    }
    Ok(())
}
