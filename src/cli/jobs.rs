// `ebiws job`: submission, status, polling and result retrieval for one tool

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::dispatcher::{Dispatcher, DispatcherConfig, JobDispatcher, Transport};
use crate::job::{
    finished_result_types, format_parameter_details, format_result_types, poll_and_fetch,
    run_batch, run_sync, submit_async, BatchConfig, BatchInput, FetchConfig, InputSource,
    OutputFilter, OutputLevel, PollConfig, SubmitRequest,
};
use crate::models::{JobId, ParameterSet};
use crate::types::{AppError, AppResult};

#[derive(Args, Debug)]
#[command(after_long_help = "\
EXAMPLES:
    # Run a BLAST search and wait for the results
    ebiws job ncbiblast --email me@example.org --param program=blastp \\
        --param database=uniprotkb_swissprot --param stype=protein sp:wap_rat

    # Submit without waiting, then collect later
    ebiws job clustalo --email me@example.org --sequence-file seqs.fa --async
    ebiws job clustalo --polljob --jobid clustalo-R20240101-000000-0000-1-p1m

    # One job per record of a FASTA file, three at a time
    ebiws job fasta --email me@example.org --multifasta --maxJobs 3 \\
        --useSeqId --param program=ssearch --sequence-file queries.fa
")]
pub struct JobArgs {
    /// Tool name, e.g. ncbiblast, clustalo, iprscan5
    pub tool: String,

    /// Sequence text or a DB:ID identifier
    pub input: Option<String>,

    /// E-mail address, required for submissions
    #[arg(long)]
    pub email: Option<String>,

    /// Title for the job
    #[arg(long)]
    pub title: Option<String>,

    /// Sequence text or a DB:ID identifier
    #[arg(long)]
    pub sequence: Option<String>,

    /// Read the sequence from a file ('-' for stdin)
    #[arg(long = "sequence-file")]
    pub sequence_file: Option<PathBuf>,

    /// File of DB:ID identifiers, one job per identifier
    #[arg(long = "id-list")]
    pub id_list: Option<PathBuf>,

    /// Treat the input as multiple FASTA records, one job each
    #[arg(long)]
    pub multifasta: bool,

    /// Name result files after the sequence id (batch mode)
    #[arg(long = "useSeqId")]
    pub use_seq_id: bool,

    /// Jobs submitted at a time in batch mode
    #[arg(long = "maxJobs", default_value_t = 1)]
    pub max_jobs: usize,

    /// Tool parameter as name=value (repeatable)
    #[arg(long = "param", short = 'p', value_name = "NAME=VALUE")]
    pub param: Vec<String>,

    /// Existing job identifier
    #[arg(long)]
    pub jobid: Option<String>,

    /// Print the status of --jobid
    #[arg(long)]
    pub status: bool,

    /// Poll --jobid until it finishes, then fetch its results
    #[arg(long)]
    pub polljob: bool,

    /// List the result types of --jobid
    #[arg(long = "resultTypes")]
    pub result_types: bool,

    /// List the tool's parameter names
    #[arg(long)]
    pub params: bool,

    /// Describe one tool parameter
    #[arg(long = "paramDetail", value_name = "PARAMETER")]
    pub param_detail: Option<String>,

    /// Base name for result files (defaults to the job id)
    #[arg(long)]
    pub outfile: Option<String>,

    /// Comma separated result types to fetch (defaults to all)
    #[arg(long)]
    pub outformat: Option<String>,

    /// Directory for result files
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Submit and print the job id without waiting
    #[arg(long = "async", visible_alias = "asyncjob")]
    pub async_job: bool,

    /// Seconds between status checks
    #[arg(long = "pollFreq", value_name = "SECONDS")]
    pub poll_freq: Option<u64>,

    /// Give up polling after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Wire protocol
    #[arg(long, value_enum)]
    pub transport: Option<Transport>,

    /// Service endpoint, overriding the tool registry
    #[arg(long = "baseUrl")]
    pub base_url: Option<String>,
}

fn parse_params(pairs: &[String]) -> AppResult<ParameterSet> {
    let mut params = ParameterSet::new();
    for pair in pairs {
        let (name, value) = ParameterSet::parse_pair(pair).ok_or_else(|| {
            AppError::InvalidRequest(format!("expected --param name=value, got '{}'", pair))
        })?;
        params.insert(name, value);
    }
    Ok(params)
}

/// Per-invocation settings with flags layered over the environment.
struct JobSettings {
    poll: PollConfig,
    fetch: FetchConfig,
    output: OutputLevel,
}

impl JobSettings {
    fn new(args: &JobArgs, config: &ClientConfig, output: OutputLevel, cancel: CancellationToken) -> Self {
        let interval = args
            .poll_freq
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.poll.interval_for(&args.tool));
        let timeout = args.timeout.map(Duration::from_secs).or(config.poll.timeout());

        Self {
            poll: PollConfig::new(interval)
                .with_timeout(timeout)
                .with_cancel(cancel)
                .with_output(output),
            fetch: FetchConfig {
                outfile: args.outfile.clone(),
                outformats: OutputFilter::from_option(args.outformat.as_deref()),
                output_dir: args.outdir.clone().unwrap_or_else(|| config.output_dir.clone()),
                output,
            },
            output,
        }
    }
}

pub async fn run(
    args: JobArgs,
    config: &ClientConfig,
    output: OutputLevel,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let transport = args.transport.unwrap_or(config.transport);
    let dispatcher_config = DispatcherConfig::for_tool(
        &args.tool,
        transport,
        args.base_url.as_deref(),
        config.http.timeout(),
    )?;
    let dispatcher = Dispatcher::new(&dispatcher_config)?;
    let settings = JobSettings::new(&args, config, output, cancel);

    execute(&dispatcher, args, config, &settings).await?;
    Ok(())
}

async fn execute(
    dispatcher: &dyn JobDispatcher,
    args: JobArgs,
    config: &ClientConfig,
    settings: &JobSettings,
) -> AppResult<()> {
    if args.params {
        for name in dispatcher.get_parameters().await? {
            println!("{}", name);
        }
        return Ok(());
    }
    if let Some(parameter) = &args.param_detail {
        let details = dispatcher.get_parameter_details(parameter).await?;
        print!("{}", format_parameter_details(&details));
        return Ok(());
    }

    if let Some(raw) = &args.jobid {
        let job_id = JobId::new(raw.as_str());
        if args.status {
            println!("{}", dispatcher.get_status(&job_id).await?);
        } else if args.result_types {
            let types = finished_result_types(dispatcher, &job_id).await?;
            print!("{}", format_result_types(&types));
        } else if args.polljob {
            poll_and_fetch(dispatcher, &job_id, &settings.poll, &settings.fetch).await?;
        } else {
            return Err(AppError::InvalidRequest(
                "--jobid needs one of --status, --resultTypes or --polljob".to_string(),
            ));
        }
        return Ok(());
    }
    if args.status || args.result_types || args.polljob {
        return Err(AppError::MissingArgument("jobid"));
    }

    submit_new(dispatcher, args, config, settings).await
}

async fn submit_new(
    dispatcher: &dyn JobDispatcher,
    args: JobArgs,
    config: &ClientConfig,
    settings: &JobSettings,
) -> AppResult<()> {
    let email = args
        .email
        .clone()
        .or_else(|| config.email.clone())
        .ok_or(AppError::MissingArgument("email"))?;
    let params = parse_params(&args.param)?;
    let template = SubmitRequest::new(email, params).with_title(args.title.clone());

    let input = InputSource::resolve(
        args.input.clone(),
        args.sequence.clone(),
        args.sequence_file.clone(),
        args.id_list.clone(),
    )?;

    let batch = match &input {
        Some(source @ InputSource::IdList(_)) => Some(BatchInput::from_id_list(&source.read().await?)),
        Some(source) if args.multifasta => Some(BatchInput::from_multifasta(&source.read().await?)),
        _ => None,
    };

    if let Some(batch) = batch {
        return submit_batch(dispatcher, &args, &template, batch, settings).await;
    }

    for flag in ignored_batch_flags(&args) {
        warn!("{} only applies to batch input and is ignored", flag);
    }

    let mut request = template;
    if let Some(source) = input {
        request.params.insert("sequence", source.read().await?);
    }
    debug!(tool = %args.tool, params = request.params.len(), "Single submission");

    if args.async_job {
        submit_async(dispatcher, &request, settings.output).await?;
    } else {
        run_sync(
            dispatcher,
            &request,
            &settings.poll,
            &settings.fetch,
            settings.poll.interval,
        )
        .await?;
    }
    Ok(())
}

/// Batch-only flags given for a single submission.
fn ignored_batch_flags(args: &JobArgs) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if args.use_seq_id {
        flags.push("--useSeqId");
    }
    if args.max_jobs != 1 {
        flags.push("--maxJobs");
    }
    flags
}

async fn submit_batch(
    dispatcher: &dyn JobDispatcher,
    args: &JobArgs,
    template: &SubmitRequest,
    batch: BatchInput,
    settings: &JobSettings,
) -> AppResult<()> {
    if batch.is_empty() {
        return Err(AppError::InvalidRequest("no records found in the input".to_string()));
    }

    if args.async_job {
        for record in batch.records() {
            let mut request = template.clone();
            request.params.insert("sequence", record.content.clone());
            submit_async(dispatcher, &request, settings.output).await?;
        }
        return Ok(());
    }

    let mut fetch = settings.fetch.clone();
    if fetch.outfile.take().is_some() {
        warn!("--outfile is ignored in batch mode; files are named after the job or sequence id");
    }
    let config = BatchConfig {
        max_jobs: args.max_jobs,
        use_seq_id: args.use_seq_id,
        poll: settings.poll.clone(),
        fetch,
    };
    let jobs = run_batch(dispatcher, template, &batch, &config).await?;

    let unfinished = jobs.iter().filter(|j| !j.status.is_finished()).count();
    if unfinished > 0 {
        warn!(unfinished, total = jobs.len(), "Some batch jobs did not finish");
    }
    Ok(())
}
