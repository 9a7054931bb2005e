//! svmeta command line interface
//!
//! Fits SVM regression meta-models and classifiers on LibSVM or CSV data and
//! evaluates individual kernels.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use svmeta::core::{Result, SVMError, SvmConfig};
use svmeta::kernel::{
    ExponentialRbfKernel, Kernel, LinearKernel, NormalRbfKernel, PolynomialKernel, RationalKernel,
    SigmoidKernel, SvmKernel,
};
use svmeta::selection::GridSearchResult;
use svmeta::solver::KernelType;
use svmeta::{CsvLoader, Dataset, LibSvmLoader, SvmClassification, SvmRegression};

#[derive(Parser)]
#[command(name = "svmeta")]
#[command(about = "Kernel SVM meta-models for regression and classification")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a regression meta-model
    Regress(RegressArgs),
    /// Fit a classifier
    Classify(ClassifyArgs),
    /// Evaluate a kernel at two points
    Kernel(KernelArgs),
}

#[derive(Args)]
struct DataArgs {
    /// Training data file (LibSVM or CSV format)
    #[arg(long)]
    data: PathBuf,

    /// Data format: auto, libsvm, or csv
    #[arg(short, long, default_value = "auto")]
    format: String,

    /// JSON configuration file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Solver kernel
    #[arg(long, default_value = "rbf")]
    kernel: CliKernelType,

    /// Tradeoff factors C to search, comma separated
    #[arg(short = 'C', long, value_delimiter = ',', default_value = "10")]
    tradeoffs: Vec<f64>,

    /// Kernel parameters to search, comma separated
    #[arg(short = 'p', long, value_delimiter = ',', default_value = "1")]
    kernel_parameters: Vec<f64>,

    /// Run the grid search on all cores
    #[arg(long)]
    parallel: bool,
}

#[derive(Args)]
struct RegressArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Number of trailing CSV columns holding outputs
    #[arg(long, default_value = "1")]
    outputs: usize,

    /// Write residuals and selected hyperparameters as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct ClassifyArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Class weights, in first-seen label order
    #[arg(long, value_delimiter = ',')]
    weights: Vec<f64>,

    /// Tile the inputs with k-means and train one classifier per cluster
    #[arg(long)]
    clusters: Option<usize>,

    /// Data file whose rows are classified after training
    #[arg(long)]
    test: Option<PathBuf>,

    /// Output predictions file (prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct KernelArgs {
    /// Kernel family
    #[arg(long)]
    kernel: CliKernel,

    /// Kernel parameters, comma separated, in declaration order
    #[arg(long, value_delimiter = ',')]
    parameters: Vec<f64>,

    /// First point, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    x: Vec<f64>,

    /// Second point, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    y: Vec<f64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernelType {
    Linear,
    Polynomial,
    Rbf,
    Sigmoid,
}

impl From<CliKernelType> for KernelType {
    fn from(kernel: CliKernelType) -> Self {
        match kernel {
            CliKernelType::Linear => KernelType::Linear,
            CliKernelType::Polynomial => KernelType::Polynomial,
            CliKernelType::Rbf => KernelType::Rbf,
            CliKernelType::Sigmoid => KernelType::Sigmoid,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    Linear,
    Polynomial,
    #[value(name = "normal-rbf")]
    NormalRbf,
    #[value(name = "exponential-rbf")]
    ExponentialRbf,
    Sigmoid,
    Rational,
}

#[derive(Serialize)]
struct RegressionReport {
    residuals: Vec<f64>,
    relative_errors: Vec<f64>,
    selections: Vec<GridSearchResult>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Regress(args) => regress_command(args),
        Commands::Classify(args) => classify_command(args),
        Commands::Kernel(args) => kernel_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(args: &DataArgs) -> Result<SvmConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {path:?}");
            SvmConfig::from_json_file(path)?
        }
        None => SvmConfig::default(),
    };
    config.parallel |= args.parallel;
    Ok(config)
}

fn load_dataset(path: &Path, format: &str, outputs: usize) -> Result<Dataset> {
    let format = if format == "auto" {
        detect_format(path)
    } else {
        format.to_string()
    };
    info!("Loading {path:?} as {format} format");

    match format.as_str() {
        "libsvm" => {
            if outputs != 1 {
                warn!("LibSVM files carry a single target; ignoring --outputs {outputs}");
            }
            LibSvmLoader::from_file(path)
        }
        "csv" => CsvLoader::new(outputs).from_file(path),
        _ => Err(SVMError::InvalidParameter(format!(
            "Unsupported format: {format}. Use 'libsvm' or 'csv'"
        ))),
    }
}

fn regress_command(args: RegressArgs) -> Result<()> {
    let config = load_config(&args.data)?;
    let dataset = load_dataset(&args.data.data, &args.data.format, args.outputs)?;
    info!(
        "Loaded {} samples with {} inputs and {} outputs",
        dataset.len(),
        dataset.inputs.dim(),
        dataset.outputs.dim()
    );

    let result = SvmRegression::new(dataset.inputs, dataset.outputs)?
        .with_kernel_type(args.data.kernel.into())
        .with_tradeoffs(args.data.tradeoffs.clone())
        .with_kernel_parameters(args.data.kernel_parameters.clone())
        .with_config(config)
        .run()?;

    println!("=== Regression Results ===");
    for (j, selection) in result.selections.iter().enumerate() {
        println!(
            "Output {j}: C={} kernel parameter={} residual={:.6e} relative error={:.6e}",
            selection.best_tradeoff,
            selection.best_kernel_parameter,
            result.residuals[j],
            result.relative_errors[j]
        );
    }

    if let Some(path) = args.report {
        let report = RegressionReport {
            residuals: result.residuals,
            relative_errors: result.relative_errors,
            selections: result.selections,
        };
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &report)?;
        info!("Report saved to: {path:?}");
    }
    Ok(())
}

fn classify_command(args: ClassifyArgs) -> Result<()> {
    let config = load_config(&args.data)?;
    let dataset = load_dataset(&args.data.data, &args.data.format, 1)?;
    info!(
        "Loaded {} samples with {} dimensions",
        dataset.len(),
        dataset.inputs.dim()
    );

    let labels = dataset.labels();
    let mut classifier = SvmClassification::new(dataset.inputs, labels)?
        .with_kernel_type(args.data.kernel.into())
        .with_tradeoffs(args.data.tradeoffs.clone())
        .with_kernel_parameters(args.data.kernel_parameters.clone())
        .with_config(config);
    if !args.weights.is_empty() {
        classifier.set_weights(args.weights.clone())?;
    }

    match args.clusters {
        Some(k) => classifier.run_clustered(k)?,
        None => classifier.run()?,
    }
    println!("Training accuracy: {:.2}%", classifier.accuracy()?);

    if let Some(test) = &args.test {
        let test_set = load_dataset(test, &args.data.format, 1)?;
        let predictions = test_set
            .inputs
            .rows()
            .map(|row| classifier.classify(row))
            .collect::<Result<Vec<f64>>>()?;

        let mut out: Box<dyn Write> = match &args.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(std::io::stdout()),
        };
        writeln!(out, "# Predictions for {} samples", predictions.len())?;
        writeln!(out, "# Format: sample_index predicted_label")?;
        for (i, label) in predictions.iter().enumerate() {
            writeln!(out, "{i} {label}")?;
        }
        out.flush()?;
    }
    Ok(())
}

fn build_kernel(kind: CliKernel, parameters: &[f64]) -> Result<SvmKernel> {
    let mut kernel: SvmKernel = match kind {
        CliKernel::Linear => LinearKernel::new().into(),
        CliKernel::Polynomial => PolynomialKernel::default().into(),
        CliKernel::NormalRbf => NormalRbfKernel::default().into(),
        CliKernel::ExponentialRbf => ExponentialRbfKernel::default().into(),
        CliKernel::Sigmoid => SigmoidKernel::default().into(),
        CliKernel::Rational => RationalKernel::default().into(),
    };
    if !parameters.is_empty() || kernel.parameter().is_empty() {
        kernel.set_parameter(parameters)?;
    }
    Ok(kernel)
}

fn kernel_command(args: KernelArgs) -> Result<()> {
    let kernel = build_kernel(args.kernel, &args.parameters)?;
    if args.x.is_empty() || args.x.len() != args.y.len() {
        return Err(SVMError::DimensionMismatch {
            expected: args.x.len(),
            actual: args.y.len(),
        });
    }

    println!("Kernel: {}", kernel.name());
    for (name, value) in kernel.parameter_description().iter().zip(kernel.parameter()) {
        println!("  {name} = {value}");
    }
    println!("Value: {:.10}", kernel.value(&args.x, &args.y));
    println!("Gradient: {:?}", kernel.gradient(&args.x, &args.y));
    let hessian = kernel.hessian(&args.x, &args.y);
    println!("Hessian:");
    for i in 0..hessian.dim() {
        println!("  {:?}", hessian.row(i));
    }
    Ok(())
}

fn detect_format(path: &Path) -> String {
    if let Some(ext) = path.extension() {
        match ext.to_str() {
            Some("csv") => "csv".to_string(),
            Some("libsvm") | Some("svm") => "libsvm".to_string(),
            _ => {
                warn!("Unknown file extension, assuming LibSVM format");
                "libsvm".to_string()
            }
        }
    } else {
        warn!("No file extension, assuming LibSVM format");
        "libsvm".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(detect_format(&PathBuf::from("test.csv")), "csv");
        assert_eq!(detect_format(&PathBuf::from("test.libsvm")), "libsvm");
        assert_eq!(detect_format(&PathBuf::from("test.svm")), "libsvm");
        assert_eq!(detect_format(&PathBuf::from("test")), "libsvm");
    }

    #[test]
    fn test_build_kernel_parameters() {
        let kernel = build_kernel(CliKernel::NormalRbf, &[2.0]).unwrap();
        assert_eq!(kernel.parameter(), vec![2.0]);
        assert!(build_kernel(CliKernel::Sigmoid, &[1.0]).is_err());
        let kernel = build_kernel(CliKernel::Polynomial, &[]).unwrap();
        assert_eq!(kernel.parameter().len(), 3);
    }
}
