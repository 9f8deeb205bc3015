use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pest_advisor::{
    config::{Config, TrainingConfig, DEFAULT_IMAGE_SIZE},
    training::Trainer,
    web::serve,
    Diagnosis, DiagnosisPipeline, PestClassifier,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pest-advisor")]
#[command(about = "Rice pest classifier with pesticide recommendations")]
struct Args {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the classifier from a directory of class subdirectories
    Train {
        /// Dataset root; each subdirectory is one class
        #[arg(long)]
        dataset: PathBuf,

        /// Output model file
        #[arg(long, default_value = "pest_model.json")]
        output: PathBuf,

        /// Feature image width
        #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE.0)]
        width: u32,

        /// Feature image height
        #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE.1)]
        height: u32,

        /// Fraction of samples used for training
        #[arg(long, default_value_t = 0.8)]
        split_ratio: f64,

        /// Random seed for the train/test split
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// SVM penalty parameter
        #[arg(long, default_value_t = 1.0)]
        c: f64,

        /// Classify this image with the freshly trained model
        #[arg(long)]
        sample: Option<PathBuf>,
    },

    /// Run the web service
    Serve {
        /// Server bind address
        #[arg(long, default_value = "0.0.0.0:5000")]
        bind: String,

        /// Trained model file
        #[arg(long, default_value = "pest_model.json")]
        model: PathBuf,

        /// Directory for uploaded images
        #[arg(long, default_value = "static/uploads")]
        upload_dir: PathBuf,

        /// Number of worker threads
        #[arg(long)]
        workers: Option<usize>,

        /// Enable development mode
        #[arg(long)]
        dev: bool,
    },

    /// Classify a single image file
    Classify {
        /// Trained model file
        #[arg(long, default_value = "pest_model.json")]
        model: PathBuf,

        /// Image to classify
        image: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    match args.command {
        Command::Train {
            dataset,
            output,
            width,
            height,
            split_ratio,
            seed,
            c,
            sample,
        } => {
            let mut config = TrainingConfig::new(dataset, output);
            config.image_size = (width, height);
            config.split_ratio = split_ratio;
            config.seed = seed;
            config.c = c;

            tracing::info!("Training from {}", config.dataset_path.display());
            let (artifact, report) = Trainer::new(config.clone()).run()?;

            println!("Classes: {}", report.class_names.join(", "));
            println!(
                "Samples: {} train, {} test, {} skipped",
                report.metrics.train_samples, report.metrics.test_samples, report.metrics.skipped_files
            );
            match report.metrics.measured_accuracy() {
                Some(accuracy) => println!("Model Accuracy: {:.2}%", accuracy * 100.0),
                None => println!("Model Accuracy: n/a (no held-out samples)"),
            }
            println!("Training time: {:.1}s", report.elapsed_secs);
            println!("Model saved as {}", config.output_path.display());

            if let Some(sample) = sample {
                let pipeline = DiagnosisPipeline::new(PestClassifier::from_artifact(artifact)?);
                print_diagnosis(&pipeline.diagnose_path(&sample)?);
            }
        }
        Command::Serve {
            bind,
            model,
            upload_dir,
            workers,
            dev,
        } => {
            let config = Config::new(bind, model, upload_dir, workers, dev)?;
            tracing::info!("Starting pest advisor service...");
            tracing::info!("Bind address: {}", config.bind_addr);
            tracing::info!("Model file: {}", config.model_path.display());

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(config.workers)
                .enable_all()
                .build()
                .context("Failed to build tokio runtime")?;
            runtime.block_on(serve(config))?;
        }
        Command::Classify { model, image } => {
            let pipeline = DiagnosisPipeline::load(&model)?;
            print_diagnosis(&pipeline.diagnose_path(&image)?);
        }
    }

    Ok(())
}

fn print_diagnosis(diagnosis: &Diagnosis) {
    println!("Pest Detected: {}", diagnosis.pest);
    println!("Confidence: {:.1}%", diagnosis.confidence * 100.0);
    if diagnosis.remedies.is_empty() {
        println!("Recommended Pesticide: {}", diagnosis.pesticide);
    }
    for remedy in &diagnosis.remedies {
        println!("Recommended Pesticide: {} ({:.2})", remedy.name, remedy.price);
    }
    println!("Organic Alternative: {}", diagnosis.organic);
    println!("Effect on Soil: {}", diagnosis.soil_effect);
}
