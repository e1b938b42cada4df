use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hls::QualityLadder;
use playback_engine::{
    Collaborators, HttpManifestFetcher, ManifestFetcher, MediaPlayer, MediaRequest, MediaSource,
    MemoryProgressStore, PlaybackConfig, PlaybackSession, PlaybackState, SessionCommand,
    SessionView, Settings, episode_number,
};
use skip_times::{
    AniSkipClient, AniZipClient, SkipIntervalResolver, SkipKind, SkipTimesConfig,
    SkipTimesService, StaticCatalogIds, VoteType,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use crate::cli::{OutputFormat, SimulateArgs};
use crate::output::OutputManager;
use crate::scripted::ScriptedSkipTimes;
use crate::simulated::SimulatedPlayer;

/// How often the simulated clock is checked for end of media
const END_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Time given to fire-and-forget vote submissions before the session closes
const VOTE_GRACE: Duration = Duration::from_secs(2);

pub struct CommandExecutor {
    timeout: Duration,
    settings: Settings,
    output: OutputManager,
}

impl CommandExecutor {
    /// `instance` is saved as the user's skip-time instance for every command.
    pub fn new(timeout: Duration, instance: Option<&str>, format: OutputFormat) -> Self {
        let settings = Settings::in_memory();
        if let Some(instance) = instance {
            settings.set_skip_times_instance(instance);
        }
        Self {
            timeout,
            settings,
            output: OutputManager::new(format),
        }
    }

    fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig::builder()
            .request_timeout(self.timeout)
            .build()
    }

    fn skip_times_config(&self) -> SkipTimesConfig {
        self.settings
            .skip_times_config(SkipTimesConfig::builder().timeout(self.timeout))
    }

    /// Resolver backed by the public mapping and skip-time services.
    ///
    /// No title lookup is configured, so a catalog id override is required
    /// for anything to resolve.
    fn online_resolver(&self) -> Result<SkipIntervalResolver> {
        let config = self.skip_times_config();
        let client = config
            .build_client()
            .context("Failed to build skip-time HTTP client")?;
        let mapping = AniZipClient::new(client.clone(), &config)?;
        let service = AniSkipClient::new(client, &config)?;
        Ok(SkipIntervalResolver::new(
            Arc::new(StaticCatalogIds::new()),
            Arc::new(mapping),
            Arc::new(service),
        ))
    }

    pub async fn ladder(&self, url: &Url, preferred: Option<&str>) -> Result<()> {
        let fetcher = HttpManifestFetcher::new(&self.playback_config())?;
        let body = fetcher
            .fetch(url)
            .await
            .with_context(|| format!("Failed to fetch manifest {url}"))?;

        let ladder = QualityLadder::from_manifest(&body, url);
        let selected = ladder.select(preferred);
        info!("Found {} quality variants", ladder.len());
        println!("{}", self.output.format_ladder(&ladder, selected)?);
        Ok(())
    }

    pub async fn skips(&self, title: &str, episode: &str, catalog_id: Option<i64>) -> Result<()> {
        let episode = episode_number(episode);
        if catalog_id.is_none() {
            warn!("No catalog id given for {:?}; pass --catalog-id to resolve skip times", title);
        }

        let resolver = self.online_resolver()?;
        let intervals = resolver.resolve(title, catalog_id, episode).await;
        println!("{}", self.output.format_intervals(&intervals)?);
        Ok(())
    }

    pub async fn vote(&self, skip_id: &str, vote: VoteType) -> Result<()> {
        let config = self.skip_times_config();
        let client = AniSkipClient::new(config.build_client()?, &config)?;
        client
            .vote(skip_id, vote)
            .await
            .with_context(|| format!("Failed to submit {vote} for {skip_id}"))?;
        println!("{}", self.output.format_vote(skip_id, &vote.to_string())?);
        Ok(())
    }

    /// Replay one episode against a simulated clock, printing every view change.
    pub async fn simulate(&self, args: SimulateArgs) -> Result<()> {
        let player = Arc::new(SimulatedPlayer::new(args.duration, args.time_scale));
        let source = MediaSource::parse(&args.source, args.title.clone())?;
        let source_id = format!("{}#{}", args.title, args.episode);
        let request = MediaRequest::new(source, source_id.clone())
            .with_episode(args.episode.clone())
            .with_provider("simulated");

        let settings = self.settings.clone();
        settings.set_auto_skip(SkipKind::Intro, args.auto_skip_intro);
        settings.set_auto_skip(SkipKind::Outro, args.auto_skip_outro);
        settings.set_skip_feedback(args.vote.is_some());
        if let Some(resume) = args.resume {
            settings.save_position(&source_id, resume, args.duration);
        }

        let scripted = Arc::new(ScriptedSkipTimes::new(args.intro, args.outro));
        let resolver = match args.catalog_id {
            Some(id) => {
                settings.set_catalog_override(&args.title, id);
                self.online_resolver()?
            }
            None => SkipIntervalResolver::new(
                Arc::new(StaticCatalogIds::new().with(&args.title, 1)),
                scripted.clone(),
                scripted.clone(),
            ),
        };

        let config = self.playback_config();
        let progress = Arc::new(MemoryProgressStore::new());
        let services = Collaborators::new(
            Arc::new(HttpManifestFetcher::new(&config)?),
            resolver,
            progress.clone(),
            settings,
        );
        let media: Arc<dyn MediaPlayer> = player.clone();
        let session = PlaybackSession::new(media, services, config);
        let handle = session.handle();
        let mut view = session.subscribe();
        let task = tokio::spawn(session.run());

        handle.open(request).await?;
        let mut rate_applied = args.rate == 1.0;
        let mut last_line = String::new();
        let mut end_check = tokio::time::interval(END_CHECK_INTERVAL);

        loop {
            tokio::select! {
                changed = view.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = view.borrow_and_update().clone();
                    let line = self.output.format_view(&current)?;
                    if line != last_line {
                        println!("{line}");
                        last_line = line;
                    }
                    if !rate_applied && current.state == PlaybackState::Playing {
                        handle.send(SessionCommand::SetRate(args.rate)).await?;
                        rate_applied = true;
                    }
                    if current.state == PlaybackState::Ended {
                        break;
                    }
                }
                _ = end_check.tick() => {
                    if player.at_end() {
                        debug!("Simulated clock reached the end of {}", source_id);
                        handle.media_ended().await?;
                    }
                }
            }
        }

        if let Some(vote) = args.vote {
            wait_for_vote_prompt(&mut view).await;
            handle.send(SessionCommand::Vote(vote.into())).await?;
            tokio::time::sleep(VOTE_GRACE).await;
            for (skip_id, vote) in scripted.votes() {
                println!("{}", self.output.format_vote(&skip_id, &vote.to_string())?);
            }
        }

        handle.send(SessionCommand::Dismiss).await?;
        task.await.context("Playback session task failed")?;

        match progress.continue_watching().first() {
            Some(record) => println!("{}", self.output.format_record(record)?),
            None => info!("No progress was saved"),
        }
        Ok(())
    }
}

/// The vote prompt is published together with the ended state, unless no
/// intervals were resolved.
async fn wait_for_vote_prompt(view: &mut watch::Receiver<SessionView>) {
    let prompt = view.wait_for(|v| v.vote_prompt);
    if tokio::time::timeout(Duration::from_secs(1), prompt).await.is_err() {
        warn!("No skip intervals to vote on");
    }
}
