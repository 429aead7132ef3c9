use clap::{Parser, Subcommand};
use colored::Colorize;
use javasx::commands;

#[derive(Parser)]
#[command(name = "javasx")]
#[command(about = "Compile markup in @Render annotations into Java component classes", long_about = None)]
#[command(version)]
struct Cli {
    /// Print debug output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new javasx project
    Init {
        /// Name of the project
        name: String,
    },
    /// Generate component classes for a project or a single .java file
    Compile {
        /// Path to project directory or .java file (defaults to current directory)
        #[arg(default_value = ".")]
        target: String,
        /// Also print the generated sources of a project
        #[arg(long)]
        print: bool,
    },
    /// Report diagnostics without writing generated sources
    Check {
        /// Path to project directory or .java file (defaults to current directory)
        #[arg(default_value = ".")]
        target: String,
    },
    /// Watch for changes and regenerate automatically
    Watch {
        /// Path to project directory or .java file (defaults to current directory)
        #[arg(default_value = ".")]
        target: String,
    },
    /// Suggest completions for markup typed into a @Render annotation
    Complete {
        /// Java file declaring the render method
        file: String,
        /// Render method as `Type.method`
        member: String,
        /// Markup typed so far
        text: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Init { name } => commands::init::execute(&name),
        Commands::Compile { target, print } => commands::compile::execute(&target, print),
        Commands::Check { target } => commands::check::execute(&target),
        Commands::Watch { target } => commands::watch::execute(&target),
        Commands::Complete { file, member, text } => {
            commands::complete::execute(&file, &member, &text)
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
