//! The `sortbin taxonomy` command: show the categories and descriptors in use.

use clap::Args;
use serde::Serialize;
use sortbin_core::{Config, LabelIndex, TaxonomyTable};

/// Arguments for the `taxonomy` command.
#[derive(Args, Debug)]
pub struct TaxonomyArgs {
    /// Print as JSON instead of a readable listing
    #[arg(long, conflicts_with = "toml")]
    pub json: bool,

    /// Print as TOML, ready to be edited and set as `taxonomy.path`
    #[arg(long)]
    pub toml: bool,
}

#[derive(Serialize)]
struct CategoryListing<'a> {
    category: &'a str,
    descriptors: Vec<&'a str>,
}

/// Execute the taxonomy command.
pub fn execute(args: TaxonomyArgs, config: &Config) -> anyhow::Result<()> {
    let table = TaxonomyTable::load_or_builtin(config.taxonomy_path().as_deref())?;
    // Validates the table exactly as the server would at startup.
    let index = LabelIndex::build(&table)?;

    if args.toml {
        print!("{}", table.to_toml()?);
    } else if args.json {
        println!("{}", serde_json::to_string_pretty(&listing(&index))?);
    } else {
        let source = config
            .taxonomy_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string());
        println!(
            "Taxonomy ({source}): {} categories, {} descriptors\n",
            index.category_count(),
            index.len()
        );
        for entry in listing(&index) {
            println!("  {}", entry.category);
            for descriptor in entry.descriptors {
                println!("    - {descriptor}");
            }
        }
    }

    Ok(())
}

/// Group the index back into categories, in classifier order.
fn listing(index: &LabelIndex) -> Vec<CategoryListing<'_>> {
    let mut out: Vec<CategoryListing<'_>> = index
        .categories()
        .iter()
        .map(|c| CategoryListing {
            category: c,
            descriptors: vec![],
        })
        .collect();
    for label in index.labels() {
        out[label.category.index()]
            .descriptors
            .push(&label.descriptor);
    }
    out
}
