//! CLI entry point for sanity-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sanity-blog")]
#[command(version)]
#[command(about = "A blog front-end backed by the Sanity CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Config file (defaults to <cwd>/_config.yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the blog server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate,

    /// List the slug of every post
    Paths,

    /// Render one post page to stdout
    Render {
        /// Post slug
        slug: String,
    },

    /// Clean the public folder
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "sanity_blog=debug,info"
    } else {
        "sanity_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port, ip } => {
            let blog = sanity_blog::Blog::new(&base_dir, config_path)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            sanity_blog::server::start(Arc::new(blog), &ip, port).await?;
        }

        Commands::Generate => {
            let blog = sanity_blog::Blog::new(&base_dir, config_path)?;
            tracing::info!("Generating static files...");
            let stats = blog.generate().await?;
            println!(
                "Generated {} posts into {}",
                stats.posts,
                blog.public_dir.display()
            );
        }

        Commands::Paths => {
            let blog = sanity_blog::Blog::new(&base_dir, config_path)?;
            let paths = blog.paths().await?;
            for slug in &paths.slugs {
                println!("{}", sanity_blog::helpers::post_path(slug));
            }
        }

        Commands::Render { slug } => {
            let blog = sanity_blog::Blog::new(&base_dir, config_path)?;
            match blog.render_post(&slug).await? {
                Some(html) => println!("{}", html),
                None => anyhow::bail!("No post with slug {}", slug),
            }
        }

        Commands::Clean => {
            let blog = sanity_blog::Blog::new(&base_dir, config_path)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("sanity-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
