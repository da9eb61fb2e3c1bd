//! confound: experimental designs and misspecification walkthroughs.
//!
//! Subcommands:
//!
//!   design      Generate a full factorial or orthogonal array
//!   diagnose    Correlations and frequencies of a recoded design
//!   simulate    Simulate outcomes from a known model and fit a formula
//!   tutorial    Run the narrated scenarios
//!   catalogue   List or print the standard arrays
//!
//! Log verbosity follows RUST_LOG (default `confound=info`); logs go to
//! stderr, tables to stdout.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use confound::catalogue::{get_by_name, list_standard_arrays};
use confound::diagnostics::diagnose;
use confound::interaction::{add_interactions, up_to_order};
use confound::montecarlo::{monte_carlo, MonteCarloConfig};
use confound::regression::{fit, Formula};
use confound::scenarios::{Scenario, TutorialConfig};
use confound::simulate::{seeded_rng, simulate, OutcomeModel};
use confound::{available_constructions, recode_all, DesignBuilder, DesignKind, ReplicationMode, Table};

#[derive(Parser)]
#[command(name = "confound", version, about = "Experimental designs and confounding walkthroughs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a design and print it
    Design {
        #[command(flatten)]
        design: DesignArgs,
        /// Print -1/+1 codes instead of level labels
        #[arg(long)]
        recode: bool,
    },
    /// Print correlation matrix and frequency tables of a recoded design
    Diagnose {
        #[command(flatten)]
        design: DesignArgs,
        /// Highest interaction order to add before diagnosing
        #[arg(long, default_value_t = 2)]
        order: usize,
    },
    /// Simulate outcomes and fit a formula
    Simulate(SimulateArgs),
    /// Run the tutorial scenarios
    Tutorial(TutorialArgs),
    /// List the standard arrays, or print one
    Catalogue {
        /// Array name such as L8
        name: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// Full factorial
    Full,
    /// Orthogonal array
    Oa,
}

impl From<KindArg> for DesignKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Full => DesignKind::FullFactorial,
            KindArg::Oa => DesignKind::OrthogonalArray,
        }
    }
}

#[derive(Args)]
struct DesignArgs {
    /// Design family
    #[arg(long, value_enum, default_value_t = KindArg::Oa)]
    kind: KindArg,
    /// Number of factors
    #[arg(long, default_value_t = 4)]
    factors: usize,
    /// Levels per factor
    #[arg(long, default_value_t = 2)]
    levels: u32,
    /// Copies of the base design
    #[arg(long, default_value_t = 1)]
    replications: usize,
    /// Repeat each run in place instead of stacking whole copies
    #[arg(long)]
    each_row: bool,
    /// Shuffle the run order with this seed
    #[arg(long)]
    randomize: Option<u64>,
}

impl DesignArgs {
    fn build(&self) -> Result<confound::Design> {
        let mut builder = DesignBuilder::new()
            .kind(self.kind.into())
            .factors(self.factors)
            .levels(self.levels)
            .replications(self.replications);
        if self.each_row {
            builder = builder.replication_mode(ReplicationMode::EachRow);
        }
        if let Some(seed) = self.randomize {
            builder = builder.randomize(seed);
        }
        Ok(builder.build()?)
    }

    /// Recoded table with interactions up to `order`.
    fn analysis_table(&self, order: usize) -> Result<Table> {
        let design = self.build()?;
        let table = recode_all(&design.to_table())?;
        let names: Vec<&str> = design.factor_names().iter().map(String::as_str).collect();
        Ok(add_interactions(&table, &up_to_order(&names, order))?)
    }
}

#[derive(Args)]
struct SimulateArgs {
    #[command(flatten)]
    design: DesignArgs,
    /// Highest interaction order available as a column
    #[arg(long, default_value_t = 2)]
    order: usize,
    /// True intercept
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    intercept: f64,
    /// True effect as TERM=COEFFICIENT (repeatable)
    #[arg(long = "effect", value_parser = parse_effect, allow_negative_numbers = true)]
    effects: Vec<(String, f64)>,
    /// Noise standard deviation
    #[arg(long, default_value_t = 1.0)]
    noise_sd: f64,
    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Model to fit
    #[arg(long, default_value = "Y ~ A + B + C + D")]
    formula: String,
    /// Also run this many Monte Carlo replications
    #[arg(long)]
    monte_carlo: Option<usize>,
}

#[derive(Args)]
struct TutorialArgs {
    /// Scenario to run (all when omitted)
    #[arg(long, value_parser = parse_scenario)]
    scenario: Option<Scenario>,
    /// Random seed
    #[arg(long, default_value_t = TutorialConfig::default().seed)]
    seed: u64,
    /// Monte Carlo replications
    #[arg(long, default_value_t = TutorialConfig::default().replications)]
    replications: usize,
    /// Copies of the base design in simulated data
    #[arg(long, default_value_t = TutorialConfig::default().design_replications)]
    design_replications: usize,
    /// Noise standard deviation
    #[arg(long, default_value_t = TutorialConfig::default().noise_sd)]
    noise_sd: f64,
}

impl TutorialArgs {
    fn config(&self) -> TutorialConfig {
        TutorialConfig {
            seed: self.seed,
            replications: self.replications,
            design_replications: self.design_replications,
            noise_sd: self.noise_sd,
            ..TutorialConfig::default()
        }
    }
}

fn parse_effect(s: &str) -> Result<(String, f64), String> {
    let (term, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TERM=COEFFICIENT, got '{s}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad coefficient in '{s}': {e}"))?;
    Ok((term.trim().to_string(), value))
}

fn parse_scenario(s: &str) -> Result<Scenario, String> {
    s.parse::<Scenario>().map_err(|e| {
        let names: Vec<String> = Scenario::ALL.iter().map(ToString::to_string).collect();
        format!("{e} (expected one of: {})", names.join(", "))
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confound=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Design { design, recode } => {
            let built = design.build()?;
            info!(design = %built.params(), construction = built.construction(), "generated design");
            if recode {
                println!("{}", recode_all(&built.to_table())?);
            } else {
                println!("{built}");
            }
        }
        Command::Diagnose { design, order } => {
            let table = design.analysis_table(order)?;
            let report = diagnose(&table)?;
            print!("{report}");
            let pairs = report.correlations.confounded_pairs(0.999);
            if pairs.is_empty() {
                println!("No confounded pairs.");
            } else {
                println!("Confounded pairs:");
                for pair in pairs {
                    println!("  {pair}");
                }
            }
        }
        Command::Simulate(args) => run_simulation(&args)?,
        Command::Tutorial(args) => {
            let config = args.config();
            let scenarios = match args.scenario {
                Some(scenario) => vec![scenario],
                None => Scenario::ALL.to_vec(),
            };
            for scenario in scenarios {
                info!(%scenario, "running scenario");
                println!("{}", scenario.render(&config)?);
            }
        }
        Command::Catalogue { name } => match name {
            Some(name) => {
                println!("{}", get_by_name(&name)?);
            }
            None => {
                for name in list_standard_arrays() {
                    let design = get_by_name(name)?;
                    println!("{name:<4} {}", design.params());
                }
                println!();
                println!("Constructions for 2 levels:");
                for (construction, runs, max_factors) in available_constructions(2) {
                    println!("  {construction}: {runs} runs, up to {max_factors} factors");
                }
            }
        },
    }
    Ok(())
}

fn run_simulation(args: &SimulateArgs) -> Result<()> {
    if args.design.levels != 2 {
        bail!("simulation needs two-level factors, got {}", args.design.levels);
    }
    let table = args.design.analysis_table(args.order)?;
    let model = args
        .effects
        .iter()
        .fold(OutcomeModel::new(args.intercept), |m, (term, coef)| {
            m.with_effect(term.clone(), *coef)
        })
        .with_noise_sd(args.noise_sd);
    let formula = Formula::parse(&args.formula)?;

    let sim = simulate(&table, &model, &mut seeded_rng(args.seed))?;
    println!("True model: {model}");
    println!();
    println!("{}", fit(&formula, &sim.observed())?);

    if let Some(replications) = args.monte_carlo {
        let config = MonteCarloConfig::default()
            .with_replications(replications)
            .with_seed(args.seed);
        println!("{}", monte_carlo(&table, &model, &formula, &config)?);
    }
    Ok(())
}
