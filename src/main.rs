use anyhow::{Context, Result};
use clap::Parser;
use healthwatch::{
    resolve, Args, IamAccountLookup, IdentityLookup, LogFormat, Pipeline, Publisher, Reporter,
    Settings, SnsPublisher, StaticAccountId, StdoutPublisher, StreamSource, TopicAddress,
    UnavailableLookup,
};
use healthwatch_aws::{AwsError, Credentials, IamClient, SnsClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args).context("failed to load settings")?;
    init_tracing(&settings);

    let policy = settings.policy().context("invalid transition filter")?;
    let credentials = Credentials::resolve(
        args.access_key_id.as_deref(),
        args.secret_access_key.as_deref(),
    )
    .map(|credentials| match &args.session_token {
        Some(token) => credentials.with_session_token(token),
        None => credentials,
    });

    let topic = resolve_topic(&settings, &credentials).await?;
    info!(topic = %topic, policy = %policy, dry_run = settings.dry_run, "configured");

    let publisher: Box<dyn Publisher> = if settings.dry_run {
        Box::new(StdoutPublisher)
    } else {
        let credentials = credentials.context("AWS credentials are required to publish")?;
        let mut builder = SnsClient::builder()
            .region(topic.region())
            .credentials(credentials);
        if let Some(endpoint) = &settings.sns_endpoint {
            builder = builder.endpoint(endpoint);
        }
        Box::new(SnsPublisher::new(builder.build()?))
    };

    let mut pipeline = Pipeline::new(topic, policy, publisher)
        .with_reporter(Reporter::stdout(settings.verbose))
        .with_retry(settings.retry())
        .on_publish_error(settings.on_publish_error);

    let mut source = StreamSource::spawn(std::io::stdin(), "stdin");
    pipeline.run(&mut source).await.context("relay stopped")?;

    Ok(())
}

/// Install the `tracing` subscriber. Logs go to stderr; stdout carries
/// diagnostics and dry-run output.
fn init_tracing(settings: &Settings) {
    let default_level = if settings.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match settings.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Expand the configured topic into a full ARN.
async fn resolve_topic(
    settings: &Settings,
    credentials: &Result<Credentials, AwsError>,
) -> Result<TopicAddress> {
    let lookup: Box<dyn IdentityLookup> = match (&settings.account_id, credentials) {
        (Some(account_id), _) => Box::new(
            StaticAccountId::new(account_id).context("invalid configured account id")?,
        ),
        (None, Ok(credentials)) => {
            let mut builder = IamClient::builder().credentials(credentials.clone());
            if let Some(endpoint) = &settings.iam_endpoint {
                builder = builder.endpoint(endpoint);
            }
            Box::new(IamAccountLookup::new(builder.build()?))
        }
        (None, Err(e)) => Box::new(UnavailableLookup::new(e.to_string())),
    };

    resolve(settings.topic(), &settings.region, lookup.as_ref())
        .await
        .with_context(|| format!("cannot resolve topic {:?}", settings.topic()))
}
