use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;

use pc_build_planner::{
    document_for, export_csv, export_to_file, format_grouped, format_summary, format_total,
    logging, BuildController, BuildRow, CategoryRegistry, Config, HydrationSource, RowField,
    SqliteStore,
};

const USAGE: &str = "\
Usage: pc-build [command]

Commands:
  tui                                    Open the terminal editor (default)
  list                                   Print the build
  add <category> [product] [price] [source]
  edit <row> <field> <value>             field: category | product | price | source
  delete <row>
  move <from> <to>
  clear                                  Remove every row and the saved build
  total                                  Print the grand total
  summary                                Print the shareable markdown summary
  export [dir]                           Write the build as JSON
  export-csv <path>
  import <path>                          Replace the build with a JSON file
  categories                             List the standard categories

Rows are numbered from 1, as shown by `list`.";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("tui");

    let config = Config::load().context("Failed to load configuration")?;

    if command == "tui" {
        return run_ui_mode(&config);
    }

    logging::init_stderr();

    match command {
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        "categories" => {
            let registry = CategoryRegistry::standard();
            for entry in registry.entries() {
                println!("{:<24} {}", entry.name, entry.icon_id);
            }
            Ok(())
        }
        _ => run_command(&config, command, &args[1..]),
    }
}

fn open_controller(config: &Config) -> Result<(BuildController<SqliteStore>, HydrationSource)> {
    let store_path = config.store_path()?;
    let store = SqliteStore::open(&store_path)
        .with_context(|| format!("Failed to open build store at {}", store_path.display()))?;

    let document = document_for(&config.default_document);
    Ok(BuildController::hydrate(store, document.as_ref()))
}

/// Turn a 1-based row number from the command line into a list position
fn parse_row(arg: Option<&String>, len: usize) -> Result<usize> {
    let arg = arg.context("Missing row number")?;
    let number: usize = arg
        .parse()
        .with_context(|| format!("'{}' is not a row number", arg))?;

    if number == 0 || number > len {
        bail!("Row {} does not exist (the build has {} rows)", number, len);
    }
    Ok(number - 1)
}

fn run_command(config: &Config, command: &str, args: &[String]) -> Result<()> {
    let (mut controller, source) = open_controller(config)?;
    tracing::debug!(source = source.as_str(), "build hydrated");

    match command {
        "list" => print_build(&controller),

        "add" => {
            let category = args.first().context("Missing category")?;
            let row = BuildRow::new(
                Some(category.as_str()),
                args.get(1).map(String::as_str),
                args.get(2).map(String::as_str),
                args.get(3).map(String::as_str),
            );
            if !CategoryRegistry::standard().contains(&row.category) {
                eprintln!("⚠️  '{}' is not a standard category; keeping it as typed", row.category);
            }
            controller.add_row(row)?;
            println!("✓ Added row {}", controller.list().len());
        }

        "edit" => {
            let position = parse_row(args.first(), controller.list().len())?;
            let field_name = args.get(1).context("Missing field name")?;
            let field = RowField::parse(field_name)
                .with_context(|| format!("Unknown field '{}'", field_name))?;
            let value = args.get(2).map(String::as_str).unwrap_or_default();

            controller.edit_row(position, field, value)?;
            println!("✓ Row {} {} set to {:?}", position + 1, field.label(), value);
        }

        "delete" => {
            let position = parse_row(args.first(), controller.list().len())?;
            controller.delete_row(position)?;
            println!("✓ Deleted row {}", position + 1);
        }

        "move" => {
            let len = controller.list().len();
            let from = parse_row(args.first(), len)?;
            let to = parse_row(args.get(1), len)?;
            if controller.reorder(from, to)? {
                println!("✓ Moved row {} to {}", from + 1, to + 1);
            } else {
                println!("Nothing to move");
            }
        }

        "clear" => {
            controller.clear()?;
            println!("✓ Build cleared");
        }

        "total" => println!("{}", format_total(controller.total())),

        "summary" => print!("{}", format_summary(controller.list())),

        "export" => {
            let dir = args.first().map(String::as_str).unwrap_or(".");
            let path = export_to_file(controller.list(), Path::new(dir), &config.export_filename)
                .with_context(|| format!("Failed to export build to {}", dir))?;
            println!("✓ Exported {} rows to {}", controller.list().len(), path.display());
        }

        "export-csv" => {
            let path = args.first().context("Missing output path")?;
            export_csv(controller.list(), Path::new(path))
                .with_context(|| format!("Failed to write {}", path))?;
            println!("✓ Wrote {}", path);
        }

        "import" => {
            let path = args.first().context("Missing file to import")?;
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path))?;
            let count = controller.import(&contents)?;
            println!("✓ Imported {} rows from {}", count, path);
        }

        other => {
            eprintln!("Unknown command '{}'\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_build(controller: &BuildController<SqliteStore>) {
    let registry = CategoryRegistry::standard();

    if controller.list().is_empty() {
        println!("The build is empty. Add a row with: pc-build add <category>");
        return;
    }

    println!("{:>3}  {:<24} {:<40} {:>12}  {}", "#", "Category", "Product", "Price", "Source");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for (position, row) in controller.list().iter_positioned() {
        let marker = if registry.contains(&row.category) { "" } else { " ?" };
        let price = if row.price.trim().is_empty() {
            String::new()
        } else if row.price_is_valid() {
            format_grouped(row.price_value())
        } else {
            format!("{} (ignored)", row.price)
        };

        println!(
            "{:>3}  {:<24} {:<40} {:>12}  {}",
            position + 1,
            format!("{}{}", row.category, marker),
            row.product.replace('\n', " "),
            price,
            row.source
        );
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{:>3}  {:<65} {:>12}", "", "Total", format_total(controller.total()));
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    use pc_build_planner::{ui, Osc52Clipboard};

    let log_file = config.log_file()?;
    logging::init_file(&log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    println!("🖥️  Loading PC Build Planner...\n");
    let (controller, source) = open_controller(config)?;
    println!("✓ Loaded {} rows ({})", controller.list().len(), source.as_str());
    println!("Starting editor... (Press 'q' to quit)\n");

    let export_dir = env::current_dir().context("Failed to read the current directory")?;
    let mut app = ui::App::new(
        controller,
        export_dir,
        config.export_filename.clone(),
        Box::new(Osc52Clipboard::stdout()),
    );
    ui::run_ui(&mut app)?;

    println!("\n✅ Editor closed, build saved");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the command line: pc-build list");
    std::process::exit(1);
}
