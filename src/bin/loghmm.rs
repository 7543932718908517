use clap::{App, Arg, ArgMatches, SubCommand};
use loghmm::{Model, ModelConfig};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use std::io::{BufWriter, Write};
use std::sync::Arc;
#[macro_use]
extern crate log;

fn arg_verbose() -> Arg<'static, 'static> {
    Arg::with_name("verbose")
        .short("v")
        .multiple(true)
        .help("Debug mode")
}

fn arg_threads() -> Arg<'static, 'static> {
    Arg::with_name("threads")
        .long("threads")
        .short("t")
        .takes_value(true)
        .default_value("1")
        .help("Number of threads")
}

fn arg_model() -> Arg<'static, 'static> {
    Arg::with_name("model")
        .long("model")
        .short("m")
        .value_name("MODEL")
        .takes_value(true)
        .required(true)
        .help("Model file. Linear probabilities.")
}

fn arg_reads() -> Arg<'static, 'static> {
    Arg::with_name("reads")
        .long("reads")
        .short("r")
        .value_name("FASTA")
        .takes_value(true)
        .help("Observations. FASTA format. Read from stdin if not given.")
}

fn arg_workers() -> Arg<'static, 'static> {
    Arg::with_name("workers")
        .long("workers")
        .short("w")
        .takes_value(true)
        .default_value("1")
        .help("Number of sequences processed at once.")
}

fn arg_definitions() -> Arg<'static, 'static> {
    Arg::with_name("definitions")
        .long("definitions")
        .short("d")
        .value_name("DEFINITIONS")
        .takes_value(true)
        .help("Learnable and constant parameters.")
}

fn subcommand_train() -> App<'static, 'static> {
    SubCommand::with_name("train")
        .version("0.1")
        .about("Training a model on observations.")
        .arg(arg_verbose())
        .arg(arg_threads())
        .arg(arg_model().required_unless("states"))
        .arg(
            Arg::with_name("states")
                .long("states")
                .takes_value(true)
                .conflicts_with("model")
                .help("Start from a random model with this many states over DNA."),
        )
        .arg(
            Arg::with_name("linear")
                .long("linear")
                .takes_value(true)
                .requires("states")
                .possible_values(&["left", "right"])
                .help("Start from a left-to-right chain built from the reads, aligned to this end."),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .default_value("32389")
                .help("Seed"),
        )
        .arg(arg_reads())
        .arg(arg_workers())
        .arg(arg_definitions())
        .arg(
            Arg::with_name("algorithm")
                .long("algorithm")
                .short("a")
                .takes_value(true)
                .possible_values(&["baum-welch", "bw", "baum-welch-trans", "bw-trans", "viterbi", "vit"])
                .default_value("baum-welch")
                .help("Re-estimation algorithm."),
        )
        .arg(
            Arg::with_name("iterations")
                .long("iterations")
                .takes_value(true)
                .default_value("100")
                .help("Maximum number of iterations."),
        )
        .arg(
            Arg::with_name("epsilon")
                .long("epsilon")
                .takes_value(true)
                .default_value("0.000001")
                .help("Convergence threshold of the likelihood."),
        )
        .arg(
            Arg::with_name("patience")
                .long("patience")
                .takes_value(true)
                .default_value("5")
                .help("Number of stable iterations to stop."),
        )
        .arg(
            Arg::with_name("pseudo")
                .long("pseudo")
                .takes_value(true)
                .default_value("0.001")
                .help("Pseudo count."),
        )
        .arg(
            Arg::with_name("log")
                .long("log")
                .help("Write log probabilities instead of linear ones."),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .short("o")
                .takes_value(true)
                .help("Output model file. Write to stdout if not given."),
        )
}

fn subcommand_decode() -> App<'static, 'static> {
    SubCommand::with_name("decode")
        .version("0.1")
        .about("Decoding the most probable state paths.")
        .arg(arg_verbose())
        .arg(arg_threads())
        .arg(arg_model())
        .arg(arg_reads())
        .arg(arg_workers())
        .arg(
            Arg::with_name("nbest")
                .long("nbest")
                .short("n")
                .takes_value(true)
                .default_value("1")
                .help("Number of paths per observation."),
        )
}

fn subcommand_likelihood() -> App<'static, 'static> {
    SubCommand::with_name("likelihood")
        .version("0.1")
        .about("Log-likelihood of each observation.")
        .arg(arg_verbose())
        .arg(arg_threads())
        .arg(arg_model())
        .arg(arg_reads())
        .arg(arg_workers())
        .arg(
            Arg::with_name("binary")
                .long("binary")
                .help("Little-endian f32 instead of text."),
        )
}

fn subcommand_derivatives() -> App<'static, 'static> {
    SubCommand::with_name("derivatives")
        .version("0.1")
        .about("Binary dump of the derivatives of each observation.")
        .arg(arg_verbose())
        .arg(arg_threads())
        .arg(arg_model())
        .arg(arg_reads())
        .arg(arg_workers())
        .arg(arg_definitions())
        .arg(
            Arg::with_name("path")
                .long("path")
                .help("Derivatives of the best path instead of the likelihood."),
        )
}

fn subcommand_sample() -> App<'static, 'static> {
    SubCommand::with_name("sample")
        .version("0.1")
        .about("Sampling DNA sequences from a model.")
        .arg(arg_verbose())
        .arg(arg_threads())
        .arg(arg_model())
        .arg(
            Arg::with_name("length")
                .long("length")
                .short("l")
                .takes_value(true)
                .default_value("100")
                .help("Length of each sequence."),
        )
        .arg(
            Arg::with_name("number")
                .long("number")
                .takes_value(true)
                .default_value("10")
                .help("Number of sequences."),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .default_value("32389")
                .help("Seed"),
        )
}

fn parse<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> loghmm::Result<T> {
    matches
        .value_of(name)
        .and_then(|e| e.parse().ok())
        .ok_or_else(|| loghmm::Error::Invalid(format!("--{} is not valid.", name)))
}

fn load(matches: &ArgMatches, pseudo: f64) -> loghmm::Result<Model> {
    let workers: usize = match matches.is_present("workers") {
        true => parse(matches, "workers")?,
        false => 1,
    };
    let config = ModelConfig::new(pseudo, workers, true);
    let mut model = match matches.value_of("model") {
        Some(path) => loghmm::model_file::load_model(path, &config)?,
        None => {
            let states: usize = parse(matches, "states")?;
            let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(parse(matches, "seed")?);
            debug!("Random model with {} states", states);
            Model::random(states, 4, &config, &mut rng)
        }
    };
    if let Some(defs) = matches.value_of("definitions") {
        let mask = loghmm::model_file::load_definitions(defs)?;
        model.set_mask(Some(mask))?;
    }
    Ok(model)
}

fn attach_reads(matches: &ArgMatches, model: &mut Model) -> loghmm::Result<Vec<String>> {
    let (ids, seqs) = loghmm::fasta::read_observations(&matches.value_of("reads"))?;
    debug!("Read {} sequences", ids.len());
    model.set_observations(Arc::new(seqs))?;
    Ok(ids)
}

fn train(matches: &ArgMatches) -> loghmm::Result<()> {
    let mut model = load(matches, parse(matches, "pseudo")?)?;
    attach_reads(matches, &mut model)?;
    if let Some(side) = matches.value_of("linear") {
        model.linear_train(side == "right")?;
    }
    let algorithm: loghmm::Algorithm = parse(matches, "algorithm")?;
    let config = loghmm::TrainConfig::new(
        parse(matches, "iterations")?,
        parse(matches, "epsilon")?,
        parse(matches, "patience")?,
        algorithm,
        matches.is_present("definitions"),
    );
    let (model, report) = loghmm::Trainer::new(config).run(model);
    info!(
        "Finished {} iterations. Converged:{}",
        report.iterations, report.converged
    );
    let mut wtr: BufWriter<Box<dyn Write>> = match matches.value_of("output") {
        Some(path) => BufWriter::new(Box::new(std::fs::File::create(path)?)),
        None => BufWriter::new(Box::new(std::io::stdout())),
    };
    if matches.is_present("log") {
        loghmm::model_file::write_log_model(&mut wtr, &model)?;
    } else {
        loghmm::model_file::write_model(&mut wtr, &model)?;
    }
    wtr.flush()?;
    Ok(())
}

fn decode(matches: &ArgMatches) -> loghmm::Result<()> {
    let mut model = load(matches, loghmm::model::DEFAULT_PSEUDO)?;
    let ids = attach_reads(matches, &mut model)?;
    let nbest: usize = parse(matches, "nbest")?;
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    if nbest == 1 {
        loghmm::dump::write_path(&mut wtr, &model)?;
    } else {
        for (dim, id) in ids.iter().enumerate() {
            for (rank, path) in model.best_paths(dim, nbest).iter().enumerate() {
                let states: Vec<_> = path.states.iter().map(|s| s.to_string()).collect();
                writeln!(wtr, "{}\t{}\t{:.4}\t{}", id, rank, path.score, states.join(" "))?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

fn likelihood(matches: &ArgMatches) -> loghmm::Result<()> {
    let mut model = load(matches, loghmm::model::DEFAULT_PSEUDO)?;
    attach_reads(matches, &mut model)?;
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    if matches.is_present("binary") {
        loghmm::dump::write_likelihood_bin(&mut wtr, &model)?;
    } else {
        loghmm::dump::write_likelihood(&mut wtr, &model)?;
    }
    wtr.flush()?;
    Ok(())
}

fn derivatives(matches: &ArgMatches) -> loghmm::Result<()> {
    let mut model = load(matches, loghmm::model::DEFAULT_PSEUDO)?;
    attach_reads(matches, &mut model)?;
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    if matches.is_present("path") {
        loghmm::dump::write_path_derivatives_bin(&mut wtr, &model)?;
    } else {
        loghmm::dump::write_model_derivatives_bin(&mut wtr, &model)?;
    }
    wtr.flush()?;
    Ok(())
}

fn sample(matches: &ArgMatches) -> loghmm::Result<()> {
    let model = load(matches, loghmm::model::DEFAULT_PSEUDO)?;
    let len: usize = parse(matches, "length")?;
    let number: usize = parse(matches, "number")?;
    let seed: u64 = parse(matches, "seed")?;
    if 4 < model.symbols() {
        warn!("{} symbols. Symbols after T are written as N.", model.symbols());
    }
    let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed);
    let records = (0..number)
        .map(|i| -> loghmm::Result<loghmm::fasta::FASTARecord> {
            let (_, xs) = loghmm::gen_seq::sample(&model, &mut rng, len)?;
            Ok((format!("{}", i), loghmm::fasta::symbols_to_dna(&xs)))
        })
        .collect::<loghmm::Result<Vec<_>>>()?;
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    loghmm::fasta::write_fasta(&mut wtr, &records)?;
    wtr.flush()?;
    Ok(())
}

fn main() -> loghmm::Result<()> {
    let matches = App::new("loghmm")
        .version("0.1")
        .about("Log-space hidden Markov models: train, decode, and evaluate on DNA observations.")
        .setting(clap::AppSettings::ArgRequiredElseHelp)
        .subcommand(subcommand_train())
        .subcommand(subcommand_decode())
        .subcommand(subcommand_likelihood())
        .subcommand(subcommand_derivatives())
        .subcommand(subcommand_sample())
        .get_matches();
    if let Some(sub_m) = matches.subcommand().1 {
        let level = match sub_m.occurrences_of("verbose") {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
        let threads: usize = parse(sub_m, "threads")?;
        if let Err(why) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            debug!("{:?}", why);
        }
    }
    debug!("Start");
    match matches.subcommand() {
        ("train", Some(sub_m)) => train(sub_m),
        ("decode", Some(sub_m)) => decode(sub_m),
        ("likelihood", Some(sub_m)) => likelihood(sub_m),
        ("derivatives", Some(sub_m)) => derivatives(sub_m),
        ("sample", Some(sub_m)) => sample(sub_m),
        _ => unreachable!(),
    }
}
