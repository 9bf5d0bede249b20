//! CLI tool that loads routes from a pipe-delimited file into the database,
//! or exports the stored routes in the same format.
//!
//! ```text
//! DATABASE_URL=sqlite://busroute.db cargo run --bin import_routes -- --input=demos/routes.txt
//! DATABASE_URL=sqlite://busroute.db cargo run --bin import_routes -- --export=backup.txt
//! ```

use busroute::db::RouteRepository;
use busroute::routes_file::{format_line, parse_routes};
use std::path::PathBuf;
use std::time::Instant;
use std::{env, fs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_help() {
    eprintln!(
        "\
Usage: import_routes [OPTIONS]

Import routes from, or export routes to, a `from|to|distance|price|coords_json` file.
The database is taken from DATABASE_URL.

Options:
  --input=PATH     Import routes from PATH
  --export=PATH    Write all stored routes to PATH
  --help           Show this help message"
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busroute=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let input = args
        .iter()
        .find_map(|a| a.strip_prefix("--input="))
        .map(PathBuf::from);
    let export = args
        .iter()
        .find_map(|a| a.strip_prefix("--export="))
        .map(PathBuf::from);

    if input.is_none() && export.is_none() {
        print_help();
        return Err("One of --input=PATH or --export=PATH is required".into());
    }

    dotenv::dotenv().ok();
    let database_url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let repo = busroute::db::connect(&database_url).await?;
    let t_total = Instant::now();

    if let Some(input) = input {
        if !input.exists() {
            return Err(format!("Input file does not exist: {}", input.display()).into());
        }

        let text = fs::read_to_string(&input)?;
        let parsed = parse_routes(&text);
        let mut imported = 0usize;
        let mut rejected = parsed.skipped.len();

        for (line_no, route) in parsed.routes {
            if let Err(reason) = route.validate() {
                tracing::warn!("Skipping line {}: {}", line_no, reason);
                rejected += 1;
                continue;
            }
            repo.insert_route(&route.normalized()).await?;
            imported += 1;
        }

        eprintln!(
            "Imported {} route(s) from {} ({} line(s) skipped)",
            imported,
            input.display(),
            rejected
        );
    }

    if let Some(export) = export {
        if let Some(parent) = export.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let routes = repo.list_routes().await?;
        let mut contents = String::from("# from|to|distance|price|coords_json\n");
        for route in &routes {
            contents.push_str(&format_line(route));
            contents.push('\n');
        }
        fs::write(&export, contents)?;

        eprintln!("Exported {} route(s) to {}", routes.len(), export.display());
    }

    eprintln!("Done in {:.1}s", t_total.elapsed().as_secs_f64());
    Ok(())
}
