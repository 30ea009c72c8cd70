#![allow(clippy::print_stdout, reason = "The command line tool reports on stdout")]
use crate::cli::{Args, Command, DumpFormat};
use anyhow::{bail, Context};
use clap::Parser;
use logre::{ConfigStore, DataBundle, DataTableOptions, GraphSelector, Settings, SortDirection, Table};
use logre_driver::Solutions;
use prettytable::Row;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logre=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut store = ConfigStore::load(&args.config, Settings::from_env())
        .with_context(|| format!("Failed to load the configuration {}", args.config.display()))?;
    let bundle_name = args.bundle.as_deref();

    match args.command {
        Command::Bundles => {
            let default = store.default_data_bundle().map(|bundle| bundle.name.clone());
            for bundle in store.data_bundles() {
                let marker = if default.as_ref() == Some(&bundle.name) { "*" } else { " " };
                println!(
                    "{marker} {}\t{}\t{}\t{}",
                    bundle.name, bundle.endpoint_technology, bundle.model_framework, bundle.endpoint_url
                );
            }
        }
        Command::Classes => {
            let bundle = open_bundle(&store, bundle_name)?;
            for (class, count) in bundle.get_classes_with_counts().await? {
                println!("{count}\t{}\t{}", class.label, class.uri);
            }
        }
        Command::Find {
            label,
            class,
            limit,
            offset,
        } => {
            let bundle = open_bundle(&store, bundle_name)?;
            let entities = bundle
                .find_entities(label.as_deref(), class.as_deref(), Some(limit), offset)
                .await?;
            for entity in entities {
                println!(
                    "{}\t{}\t{}",
                    entity.uri,
                    entity.label,
                    entity.class_uri.unwrap_or_default()
                );
            }
        }
        Command::Entity { uri } => {
            let bundle = open_bundle(&store, bundle_name)?;
            let entity = bundle.get_entity_basics(&uri).await?;
            println!("{} <{}>", entity.label, entity.uri);
            if let Some(class) = &entity.class_uri {
                println!("Class: {class}");
            }
            if let Some(comment) = &entity.comment {
                println!("{comment}");
            }
            println!();
            for statement in bundle.get_outgoing_statements_of(&uri, &[]).await? {
                println!("{}\t{}", statement.predicate.label, statement.object.label);
            }
            let incoming = bundle.get_incoming_statements_of_count(&uri, &[]).await?;
            println!("\n{incoming} incoming statements");
        }
        Command::Table {
            class,
            limit,
            offset,
            sort,
            desc,
            filter_column,
            filter_value,
            csv,
        } => {
            let bundle = open_bundle(&store, bundle_name)?;
            let total = bundle
                .get_class_instances_count(&class, filter_column.as_deref(), filter_value.as_deref())
                .await?;
            let options = DataTableOptions {
                limit: (!csv).then_some(limit),
                offset: if csv { 0 } else { offset },
                sort_column: sort,
                sort_direction: if desc { SortDirection::Desc } else { SortDirection::Asc },
                filter_column,
                filter_value,
            };
            let table = bundle.get_data_table(&class, &options).await?;
            if csv {
                print!("{}", table.to_csv()?);
            } else {
                print_table(&table)?;
                println!(
                    "\n{}-{} of {total}",
                    (offset + 1).min(total),
                    offset + table.len()
                );
            }
        }
        Command::Query { text, file, saved } => {
            let bundle = open_bundle(&store, bundle_name)?;
            let query = match (text, file, saved) {
                (Some(text), _, _) => text,
                (_, Some(file), _) => read(&file)?,
                (_, _, Some(name)) => store
                    .saved_query(&name)
                    .with_context(|| format!("No saved query named '{name}'"))?
                    .to_owned(),
                (None, None, None) => bail!("A query must be given with --text, --file or --saved"),
            };
            match bundle.run_sparql(&query).await? {
                Some(solutions) => print_solutions(&solutions)?,
                None => println!("Done"),
            }
        }
        Command::SaveQuery { name, text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => read(&file)?,
                (None, None) => bail!("A query must be given with --text or --file"),
            };
            store.save_query(&name, &text);
            store.save()?;
            info!(name = %name, "Saved query");
        }
        Command::Dump { format, output } => {
            let bundle = open_bundle(&store, bundle_name)?;
            fs::create_dir_all(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let files = match format {
                DumpFormat::Nq => vec![(format!("{}.nq", bundle.key()), bundle.dump_nq().await?)],
                DumpFormat::Ttl => {
                    let dump = bundle.dump_ttl().await?;
                    GraphSelector::ALL
                        .into_iter()
                        .map(|selector| {
                            (
                                format!("{}-{selector}.ttl", bundle.key()),
                                dump.get(selector).to_owned(),
                            )
                        })
                        .collect()
                }
                DumpFormat::Csv => bundle
                    .dump_csv()
                    .await?
                    .into_iter()
                    .map(|(stem, content)| (format!("{stem}.csv"), content))
                    .collect(),
            };
            for (name, content) in files {
                let path = output.join(name);
                fs::write(&path, content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}", path.display());
            }
        }
        Command::Import {
            format,
            file,
            graph,
        } => {
            let bundle = open_bundle(&store, bundle_name)?;
            let selector = graph.parse::<GraphSelector>()?;
            let body = read(&file)?;
            match format {
                DumpFormat::Nq => bundle.import_nquads(body).await?,
                DumpFormat::Ttl => bundle.import_turtle(selector, body).await?,
                DumpFormat::Csv => {
                    let count = bundle.import_csv(selector, &body).await?;
                    println!("{count} triples imported into the {selector} graph");
                }
            }
        }
        Command::AddPrefix { short, long } => {
            store.add_prefix(&short, &long)?;
            store.save()?;
            info!(short = %short, long = %long, "Added prefix");
        }
    }
    Ok(())
}

fn open_bundle(store: &ConfigStore, name: Option<&str>) -> anyhow::Result<DataBundle> {
    let name = match name {
        Some(name) => name.to_owned(),
        None => store
            .default_data_bundle()
            .map(|bundle| bundle.name.clone())
            .context("The configuration has no data bundle, add one or pass --bundle")?,
    };
    Ok(store.build_bundle(&name)?)
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn pretty_table(table: &Table) -> prettytable::Table {
    let mut out = prettytable::Table::new();
    out.set_titles(Row::from(table.columns.iter().map(|column| column.label.as_str())));
    for row in &table.rows {
        out.add_row(Row::from(row));
    }
    out
}

fn print_table(table: &Table) -> anyhow::Result<()> {
    pretty_table(table).print(&mut io::stdout())?;
    Ok(())
}

fn print_solutions(solutions: &Solutions) -> anyhow::Result<()> {
    let mut out = prettytable::Table::new();
    out.set_titles(Row::from(&solutions.variables));
    for row in solutions {
        out.add_row(Row::from(solutions.variables.iter().map(|variable| {
            row.get(variable).map(ToString::to_string).unwrap_or_default()
        })));
    }
    out.print(&mut io::stdout())?;
    println!("{} results", solutions.len());
    Ok(())
}
