use clap::{Parser, Subcommand};
use simple_web::config::{self, Context, Overrides};
use simple_web::generator::{self, Force, Generator};
use simple_web::{output, server};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread::JoinHandle;

/// Force flags shared by `build` and `serve`.
#[derive(clap::Args, Clone, Copy)]
struct ForceArgs {
    /// Rebuild everything regardless of freshness
    #[arg(short, long)]
    force: bool,

    /// Re-render every page
    #[arg(long)]
    force_pages: bool,

    /// Recreate every thumbnail
    #[arg(long)]
    force_thumbnails: bool,

    /// Copy every static file
    #[arg(long)]
    force_static: bool,

    /// Reload templates from disk and re-render every page
    #[arg(long)]
    clear_templates: bool,
}

impl From<ForceArgs> for Force {
    fn from(args: ForceArgs) -> Self {
        Force {
            all: args.force,
            pages: args.force_pages,
            thumbnails: args.force_thumbnails,
            static_files: args.force_static,
            templates: args.clear_templates,
        }
    }
}

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
#[command(name = "simple-web")]
#[command(about = "Small static website generator with incremental rebuilds")]
#[command(long_about = "\
Small static website generator with incremental rebuilds

Pages are rendered through templates; only what changed since the last
build is written again, and output whose source is gone is deleted.

Site structure:

  site/
  ├── config.toml          # Site config (optional)
  ├── pages/               # Markdown (.md, .mkd) and HTML (.html, .htm)
  │   ├── index.md         # → build/index.html
  │   └── blog/post.md     # → build/blog/post/index.html
  ├── templates/
  │   ├── page.html        # Default template
  │   ├── page.json        # Optional data for page.html, as `data`
  │   └── snippets/        # Snippets for [Snippet: name] markers
  ├── static/              # Copied to build/static/
  └── data/
      ├── globals.json     # Global template variables
      └── team.json        # Dataset, requested with `Datasets: team`

Run 'simple-web gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site directory
    #[arg(short, long, default_value = ".", global = true)]
    input: PathBuf,

    /// Config file, relative to the site directory [default: config.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pages directory
    #[arg(short, long, global = true)]
    pages: Option<PathBuf>,

    /// Templates directory
    #[arg(short, long, global = true)]
    templates: Option<PathBuf>,

    /// Extra static directory (repeatable)
    #[arg(short, long = "static-dir", global = true)]
    static_dirs: Vec<PathBuf>,

    /// Default template name
    #[arg(long, global = true)]
    template: Option<String>,

    /// Sub-path of the output directory to write the site to
    #[arg(long, global = true)]
    path_prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            output_dir: self.output.clone(),
            pages_dir: self.pages.clone(),
            templates_dir: self.templates.clone(),
            static_dirs: self.static_dirs.clone(),
            template: self.template.clone(),
            path_prefix: self.path_prefix.clone(),
        }
    }

    fn site_config(&self) -> Result<config::SiteConfig, config::ConfigError> {
        config::load_config(&self.input, self.config.as_deref(), &self.overrides())
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the site, skipping everything that is still fresh
    Build(ForceArgs),
    /// Build, then serve the output and rebuild on request
    Serve {
        #[command(flatten)]
        force: ForceArgs,

        /// Interface to listen on
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Delete the output directory
    Purge,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Unexpected failure: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Build(force) => {
            let ctx = Context::resolve(&cli.input, &cli.site_config()?)?;
            let (mut generator, printer) = generator_with_printer(ctx);
            let result = generator.build((*force).into());
            drop(generator);
            printer.join().ok();
            result?;
        }
        Command::Serve { force, host, port } => {
            let ctx = Context::resolve(&cli.input, &cli.site_config()?)?;
            let serve_root = ctx.output_dir.clone();
            let (mut generator, printer) = generator_with_printer(ctx);
            generator.build((*force).into())?;

            let server = server::bind(host, *port, &serve_root)?;
            if let Some(addr) = server.addr() {
                println!("Serving {} at http://{}/", serve_root.display(), addr);
            }
            let handle = server.spawn();
            println!("Enter (or r) rebuilds, f forces a full rebuild, q quits.");

            for line in std::io::stdin().lock().lines() {
                match line?.trim() {
                    "" | "r" => {
                        generator.build(Force::none())?;
                    }
                    "f" => {
                        generator.build(Force::everything())?;
                    }
                    "q" => break,
                    other => println!("Unknown command: {other}"),
                }
            }

            handle.shutdown();
            drop(generator);
            printer.join().ok();
        }
        Command::Purge => {
            let site_config = cli.site_config()?;
            let input_dir = std::path::absolute(&cli.input)?;
            let output_dir = config::output_dir(&input_dir, &site_config);
            config::check_output_dir(&output_dir, &[("input_dir", input_dir.as_path())])?;
            generator::purge(&output_dir);
            println!("Purged {}", output_dir.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// A generator whose events are printed on a separate thread. The thread
/// ends once the generator is dropped.
fn generator_with_printer(ctx: Context) -> (Generator, JoinHandle<()>) {
    let input_dir = ctx.input_dir.clone();
    let output_root = ctx.output_root.clone();
    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_build_event(&event, &input_dir, &output_root);
        }
    });
    (Generator::new(ctx).with_events(tx), printer)
}
