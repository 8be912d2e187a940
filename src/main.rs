use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use bucket_probe::pipeline::kubectl::{pv_name_for_pod, pv_names_for_pvc, pvc_names_for_pod};
use bucket_probe::{verify, RetryPolicy, StorageTarget};

#[derive(Parser)]
#[command(
    name = "bucket-probe",
    version,
    about = "Check backup artifacts in object storage and resolve volume names"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fail unless the object folder exists
    Exists {
        #[command(flatten)]
        object: ObjectArgs,
    },
    /// Poll until the object folder is gone
    Absent {
        #[command(flatten)]
        object: ObjectArgs,
        /// Seconds between two checks
        #[arg(long, env = "PROBE_POLL_INTERVAL_SECS", default_value_t = 60)]
        interval_secs: u64,
        /// Total number of checks
        #[arg(long, env = "PROBE_POLL_ATTEMPTS", default_value_t = 5)]
        attempts: u32,
    },
    /// Delete every object in the object folder
    Delete {
        #[command(flatten)]
        object: ObjectArgs,
    },
    /// Print the claims of a pod, one per line
    Pvcs { namespace: String, pod: String },
    /// Print the volumes bound to a claim, one per line
    Pvs { namespace: String, pvc: String },
    /// Print the single volume backing a pod
    Pv { namespace: String, pod: String },
}

#[derive(clap::Args)]
struct ObjectArgs {
    /// JSON file describing the storage target
    target: PathBuf,
    /// Object key, e.g. the backup name
    key: String,
    /// Folder under the target prefix
    #[arg(default_value = "backups")]
    sub_prefix: String,
}

impl ObjectArgs {
    fn load(&self) -> Result<StorageTarget, Box<dyn Error + Send + Sync>> {
        let target = StorageTarget::from_json_file(&self.target)?;
        info!(
            "Loaded target provider={} bucket={} prefix={}",
            target.provider, target.bucket, target.prefix
        );
        Ok(target)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Exists { object } => {
            let target = object.load()?;
            verify::must_exist(&target, &object.sub_prefix, &object.key).await?;
        }
        Commands::Absent {
            object,
            interval_secs,
            attempts,
        } => {
            let target = object.load()?;
            let policy = RetryPolicy::new(Duration::from_secs(interval_secs), attempts);
            verify::must_not_exist(&target, &object.sub_prefix, &object.key, &policy).await?;
        }
        Commands::Delete { object } => {
            let target = object.load()?;
            verify::delete_objects(&target, &object.sub_prefix, &object.key).await?;
        }
        Commands::Pvcs { namespace, pod } => {
            let names =
                tokio::task::spawn_blocking(move || pvc_names_for_pod(&namespace, &pod)).await??;
            names.iter().for_each(|name| println!("{}", name));
        }
        Commands::Pvs { namespace, pvc } => {
            let names =
                tokio::task::spawn_blocking(move || pv_names_for_pvc(&namespace, &pvc)).await??;
            names.iter().for_each(|name| println!("{}", name));
        }
        Commands::Pv { namespace, pod } => {
            let name =
                tokio::task::spawn_blocking(move || pv_name_for_pod(&namespace, &pod)).await??;
            println!("{}", name);
        }
    }

    Ok(())
}
