use clap::{ArgAction, Args, Parser, Subcommand};
use simple_index::config::{self, IndexConfig};
use simple_index::order::OrderBy;
use simple_index::output;
use simple_index::palette::{ColorOverrides, is_hex};
use simple_index::pipeline::{self, BuildOptions, OverwritePolicy};
use simple_index::scan::ScanErrorPolicy;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-index")]
#[command(about = "Static index page for a folder of HTML pages")]
#[command(long_about = "\
Static index page for a folder of HTML pages

Every subdirectory of the content directory that holds an index.html becomes
an entry on the index. Title, author, description and keywords come from the
document's <title> and <meta> tags.

Layout:

  ./                               # working directory
  ├── simple-index.toml            # optional config
  ├── index.html                   # written
  ├── staticfiles/                 # written: css, icon, script, file list
  └── content/
      ├── first-page/index.html    # entry
      ├── second-page/index.html   # entry
      └── drafts/                  # no index.html = not listed

Read from each index.html:
  Title:       <title> (required)
  Author:      <meta name=\"author\">
  Description: <meta name=\"description\">
  Keywords:    <meta name=\"keywords\"> (comma separated)

Run 'simple-index gen-config' to generate a documented simple-index.toml.")]
#[command(version = version_string())]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Where index.html and staticfiles/ are written
    #[arg(long, default_value = ".", global = true)]
    work_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by `build` and `check`.
#[derive(Args)]
struct ContentArgs {
    /// Content directory, inside the working directory
    #[arg(short = 'd', long = "content-dir")]
    content_dir: String,

    /// Order of the entries
    #[arg(long, value_enum)]
    order_by: Option<OrderBy>,

    /// Palette name (color_palette_1 .. color_palette_4, or a custom one)
    #[arg(long)]
    color_palette: Option<String>,

    /// What to do with documents that have no title
    #[arg(long, value_enum)]
    on_scan_error: Option<ScanErrorPolicy>,
}

#[derive(Args)]
struct BuildArgs {
    #[command(flatten)]
    content: ContentArgs,

    /// Write N random documents into the content directory first
    #[arg(long, default_value_t = 0)]
    test_data: usize,

    /// Header and footer background
    #[arg(long, value_parser = parse_hex)]
    color1: Option<String>,

    /// Body background
    #[arg(long, value_parser = parse_hex)]
    color2: Option<String>,

    /// Title, description and footer text
    #[arg(long, value_parser = parse_hex)]
    color3: Option<String>,

    /// Icon and entry titles
    #[arg(long, value_parser = parse_hex)]
    color4: Option<String>,

    /// What to do when staticfiles/ already exists
    #[arg(long, value_enum, default_value_t = OverwritePolicy::Prompt)]
    overwrite: OverwritePolicy,

    /// Directory with replacement templates
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// Directory whose files are copied into staticfiles/
    #[arg(long)]
    assets_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Write index.html and staticfiles/
    Build(BuildArgs),
    /// Scan and order the content directory without writing anything
    Check(ContentArgs),
    /// Print a stock simple-index.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build(args) => {
            let config = config::load_config(&cli.work_dir)?;
            let options = build_options(&cli.work_dir, &args, config);
            println!("==> Building index from {}", options.content_dir);
            let mut confirm = args.overwrite.confirmer();
            let summary = pipeline::build(&options, &mut *confirm)?;
            output::print_build_output(&summary, &cli.work_dir);
            println!("==> Build complete: {}", summary.generated.page.display());
        }
        Command::Check(args) => {
            let config = config::load_config(&cli.work_dir)?;
            let options = content_options(&cli.work_dir, &args, config);
            println!("==> Checking {}", options.content_dir);
            let summary = pipeline::check(&options)?;
            output::print_check_output(&summary);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `-v` flags win over `RUST_LOG`; without them `RUST_LOG` or `warn` applies.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_hex(code: &str) -> Result<String, String> {
    if is_hex(code) {
        Ok(code.to_string())
    } else {
        Err(format!("'{code}' is not a hex color code like #abc or #aabbcc"))
    }
}

/// Config values with the `build`/`check` flags applied on top.
fn content_options(work_dir: &Path, args: &ContentArgs, config: IndexConfig) -> BuildOptions {
    let mut options = BuildOptions::from_config(work_dir, args.content_dir.clone(), config);
    if let Some(order_by) = args.order_by {
        options.order_by = order_by;
    }
    if let Some(name) = &args.color_palette {
        options.color_palette = name.clone();
    }
    if let Some(policy) = args.on_scan_error {
        options.on_scan_error = policy;
    }
    options
}

fn build_options(work_dir: &Path, args: &BuildArgs, config: IndexConfig) -> BuildOptions {
    let mut options = content_options(work_dir, &args.content, config);
    options.test_documents = args.test_data;
    options.colors = options.colors.layered(&ColorOverrides {
        color1: args.color1.clone(),
        color2: args.color2.clone(),
        color3: args.color3.clone(),
        color4: args.color4.clone(),
    });
    if let Some(dir) = &args.template_dir {
        options.template_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.assets_dir {
        options.assets_dir = Some(dir.clone());
    }
    options
}
