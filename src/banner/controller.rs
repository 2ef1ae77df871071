// src/banner/controller.rs

use crate::banner::click::{ClickDispatcher, ClickOutcome};
use crate::banner::texture::{apply_texture, detect_slot, fit_to_format};
use crate::banner::visibility::VisibilityGate;
use crate::config::{BannerConfig, TextureProperty};
use crate::content::url::{normalize_destination, resolve_image_url};
use crate::content::BannerServices;
use crate::error::{BannerError, Result};
use crate::format::{default_image, resolve};
use crate::host::{HostContext, BANNER_COLLISION_GROUP};
use crate::lock;
use crate::logging::{BannerLog, EventLog};
use crate::model::{
    AdFormat, BannerPhase, BannerState, BetaUnitInfo, CampaignAd, ContentRecord, ContentRequest,
    FormatSpec,
};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Result of one load attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(CampaignAd),
    /// Transient failure, retried on the next tick.
    Failed(String),
    /// A later attempt was started before this one resolved; nothing applied.
    Stale,
    Disposed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Attempted(LoadOutcome),
    /// Already loaded once and not in view.
    SkippedNotVisible,
}

/// Refresh bookkeeping, only touched by the controller itself.
#[derive(Debug, Default)]
pub struct RefreshSchedule {
    timer: Option<JoinHandle<()>>,
    loaded_once: bool,
    visible: bool,
}

struct Inner {
    state: BannerState,
    issued: u64, // latest generation handed out
    schedule: RefreshSchedule,
    beta: Option<BetaUnitInfo>, // sticky once the backend declares a beta format
    disposed: bool,
}

/// Drives one banner: initial load, texture application, periodic refresh
/// gated by visibility, and click-through.
///
/// Each load attempt gets a generation number. Only the latest generation
/// may change the banner, so a slow response can never replace a newer one.
pub struct AdLifecycleController {
    id: String,
    config: BannerConfig,
    host: HostContext,
    services: BannerServices,
    gate: VisibilityGate,
    clicks: ClickDispatcher,
    events: Option<Arc<EventLog>>,
    inner: Mutex<Inner>,
}

impl AdLifecycleController {
    /// Validates the setup and prepares the surface.
    ///
    /// Fails with a fatal error when the config is invalid, the surface has
    /// no mesh, or (with `texture_property: auto`) its material pipeline is
    /// not one the banner can texture.
    pub fn new(
        config: BannerConfig,
        host: HostContext,
        services: BannerServices,
        events: Option<Arc<EventLog>>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        let surface = host.surface.as_ref();
        let material = surface.material().filter(|_| surface.has_mesh());
        let Some(material) = material else {
            error!(ad_unit = %config.ad_unit, "banner surface is missing a mesh component");
            return Err(BannerError::MissingMesh);
        };
        if config.texture_property == TextureProperty::Auto && detect_slot(&material).is_none() {
            error!(ad_unit = %config.ad_unit, pipeline = %material.pipeline, "unsupported material pipeline");
            return Err(BannerError::UnsupportedPipeline(material.pipeline));
        }
        if config.create_automatic_collision && !surface.has_collider() {
            surface.add_box_collider(BANNER_COLLISION_GROUP);
        }

        let clicks = ClickDispatcher::new(
            &config.ad_unit,
            config.beacon,
            services.beacons.clone(),
            host.opener.clone(),
            host.xr.clone(),
        );
        let id = uuid::Uuid::new_v4().to_string();
        info!(banner_id = %id, ad_unit = %config.ad_unit, format = %config.format, style = %config.style, "banner initialised");

        Ok(Arc::new(Self {
            id,
            gate: VisibilityGate::new(host.scene.clone()),
            clicks,
            config,
            host,
            services,
            events,
            inner: Mutex::new(Inner {
                state: BannerState::default(),
                issued: 0,
                schedule: RefreshSchedule::default(),
                beta: None,
                disposed: false,
            }),
        }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &BannerConfig {
        &self.config
    }

    pub fn state(&self) -> BannerState {
        self.inner().state.clone()
    }

    /// Format used for loads: the sticky beta override, else the configured one.
    pub fn effective_format(&self) -> AdFormat {
        self.inner()
            .beta
            .as_ref()
            .and_then(BetaUnitInfo::beta_format)
            .unwrap_or(self.config.format)
    }

    /// Visibility seen by the last gated tick.
    pub fn last_visible(&self) -> bool {
        self.inner().schedule.visible
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    /// First load, then the refresh timer at the configured interval.
    ///
    /// Only fatal errors are returned; a failed first fetch is retried by
    /// the timer.
    pub async fn run(self: &Arc<Self>) -> Result<()> {
        self.tick().await?;
        self.schedule_refresh(self.config.refresh_interval());
        Ok(())
    }

    /// One load attempt, regardless of visibility.
    pub async fn start(&self) -> Result<LoadOutcome> {
        let generation = {
            let mut inner = self.inner();
            if inner.disposed {
                return Ok(LoadOutcome::Disposed);
            }
            inner.issued += 1;
            inner.state.phase = BannerPhase::Loading;
            inner.issued
        };
        debug!(banner_id = %self.id, generation, "loading banner");

        let started = Instant::now();
        let result = match self.config.fetch_timeout() {
            Some(limit) => time::timeout(limit, self.fetch(generation))
                .await
                .unwrap_or(Err(BannerError::Timeout(limit))),
            None => self.fetch(generation).await,
        };
        let elapsed = started.elapsed().as_millis();
        let mut log = BannerLog::load(&self.id, &self.config.ad_unit, generation);

        let committed = result
            .and_then(|(ad, spec)| Ok((self.commit(generation, ad, spec)?, spec.format)));
        let outcome = match committed {
            Ok((LoadOutcome::Loaded(ad), format)) => {
                log.set_success(format.name(), ad.campaign_id.as_deref(), elapsed);
                LoadOutcome::Loaded(ad)
            }
            Ok((LoadOutcome::Disposed, _)) => {
                log.set_failure("disposed", "banner disposed during load", elapsed);
                LoadOutcome::Disposed
            }
            Ok((other, _)) => {
                log.set_failure("stale", "superseded by a later load", elapsed);
                other
            }
            Err(e) if e.is_fatal() => {
                self.mark_error(generation);
                error!(banner_id = %self.id, ad_unit = %self.config.ad_unit, error = %e, "banner setup failed");
                log.set_failure("fatal", &e, elapsed);
                self.record(log).await;
                return Err(e);
            }
            Err(e) => {
                if self.mark_error(generation) {
                    warn!(banner_id = %self.id, ad_unit = %self.config.ad_unit, generation, error = %e, "banner load failed");
                    log.set_failure("failure", &e, elapsed);
                    LoadOutcome::Failed(e.to_string())
                } else if self.inner().disposed {
                    log.set_failure("disposed", &e, elapsed);
                    LoadOutcome::Disposed
                } else {
                    log.set_failure("stale", &e, elapsed);
                    LoadOutcome::Stale
                }
            }
        };
        self.record(log).await;
        Ok(outcome)
    }

    /// A refresh tick: loads unconditionally until the first success, then
    /// only while the surface is in view.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let loaded_once = self.inner().schedule.loaded_once;
        if loaded_once {
            let visible = self.gate.is_visible(self.host.surface.as_ref());
            self.inner().schedule.visible = visible;
            if !visible {
                debug!(banner_id = %self.id, "banner not in view, refresh skipped");
                return Ok(TickOutcome::SkippedNotVisible);
            }
        }
        Ok(TickOutcome::Attempted(self.start().await?))
    }

    /// Starts (or restarts) the recurring refresh timer.
    ///
    /// Ticks fire on a fixed cadence even while a load is in flight; the
    /// generation check keeps overlapping loads harmless. A fatal error
    /// stops the timer.
    pub fn schedule_refresh(self: &Arc<Self>, interval: Duration) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                tokio::spawn(async move {
                    if let Err(e) = controller.tick().await {
                        error!(banner_id = %controller.id, error = %e, "refresh stopped");
                        controller.stop_refresh();
                    }
                });
            }
        });

        let mut inner = self.inner();
        if inner.disposed {
            handle.abort();
            return;
        }
        if let Some(previous) = inner.schedule.timer.replace(handle) {
            previous.abort();
        }
        info!(banner_id = %self.id, interval_ms = interval.as_millis() as u64, "banner refresh scheduled");
    }

    pub fn stop_refresh(&self) {
        if let Some(timer) = self.inner().schedule.timer.take() {
            timer.abort();
        }
    }

    /// User activation of the banner.
    pub async fn click(&self) -> ClickOutcome {
        let state = self.state();
        let outcome = self.clicks.on_activate(&state).await;
        let campaign_id = state.ad.as_ref().and_then(|ad| ad.campaign_id.as_deref());
        self.record(BannerLog::click(&self.id, &self.config.ad_unit, campaign_id, outcome.as_str()))
            .await;
        outcome
    }

    /// Stops the timer and makes every in-flight load resolve to nothing.
    pub fn dispose(&self) {
        let mut inner = self.inner();
        if inner.disposed {
            return;
        }
        inner.disposed = true;
        inner.issued += 1;
        if let Some(timer) = inner.schedule.timer.take() {
            timer.abort();
        }
        info!(banner_id = %self.id, "banner disposed");
    }

    async fn fetch(&self, generation: u64) -> Result<(CampaignAd, FormatSpec)> {
        let ad_unit = &self.config.ad_unit;
        let info = match self.services.content.unit_info(ad_unit).await {
            Ok(info) => Some(info),
            Err(e) => {
                debug!(ad_unit = %ad_unit, error = %e, "unit info unavailable");
                None
            }
        };
        let beta = {
            let mut inner = self.inner();
            if let Some(info) = info.filter(|i| i.beta_format().is_some()) {
                if inner.beta.as_ref() != Some(&info) {
                    info!(banner_id = %self.id, format = ?info.format, "backend overrides banner format");
                }
                inner.beta = Some(info);
            }
            inner.beta.clone()
        };

        let height = if self.config.scale_to_ratio {
            self.host.surface.scaling_local()[1]
        } else {
            1.0
        };
        let spec = resolve(self.services.formats.as_ref(), self.config.format, beta.as_ref(), height);
        let request = ContentRequest {
            ad_unit: ad_unit.clone(),
            network: self.config.network,
            format: spec.format,
            style: self.config.style,
        };
        let record = self.services.content.fetch(&request).await?;
        let (image, url, campaign_id) = self.interpret(record, spec.format)?;
        let texture = self.services.textures.load(&image).await?;

        Ok((
            CampaignAd {
                campaign_id,
                texture,
                image_src: image,
                url,
                generation,
            },
            spec,
        ))
    }

    /// Image URL, destination and campaign id out of either record shape.
    fn interpret(
        &self,
        record: ContentRecord,
        format: AdFormat,
    ) -> Result<(String, String, Option<String>)> {
        let ad_unit = &self.config.ad_unit;
        let endpoints = &self.config.endpoints;
        match record {
            ContentRecord::Campaign(campaign) => match campaign.ads.into_iter().next() {
                Some(asset) => Ok((
                    resolve_image_url(&asset.asset_url),
                    normalize_destination(&asset.cta_url, ad_unit, endpoints),
                    campaign.campaign_id,
                )),
                None => {
                    let image = default_image(self.services.formats.as_ref(), format, self.config.style)
                        .ok_or_else(|| BannerError::Content(format!("no ads and no default banner for {}", format)))?;
                    debug!(ad_unit = %ad_unit, "no active campaign, showing default banner");
                    Ok((image, normalize_destination(&endpoints.marketplace_root, ad_unit, endpoints), None))
                }
            },
            ContentRecord::Nft(banner) => Ok((
                resolve_image_url(&banner.data.image),
                normalize_destination(&banner.data.url, ad_unit, endpoints),
                None,
            )),
        }
    }

    /// Applies a finished load if it is still the latest one.
    fn commit(&self, generation: u64, ad: CampaignAd, spec: FormatSpec) -> Result<LoadOutcome> {
        {
            let mut inner = self.inner();
            if inner.disposed {
                return Ok(LoadOutcome::Disposed);
            }
            if generation != inner.issued {
                debug!(banner_id = %self.id, generation, latest = inner.issued, "stale banner response discarded");
                return Ok(LoadOutcome::Stale);
            }
            let surface = self.host.surface.as_ref();
            apply_texture(
                surface,
                &self.config.texture_property,
                self.config.assign_alpha_mask,
                &ad.texture,
            )?;
            if self.config.scale_to_ratio {
                fit_to_format(surface, &spec, self.config.create_automatic_collision);
            }
            inner.state = BannerState {
                phase: BannerPhase::Loaded,
                ad: Some(ad.clone()),
            };
            inner.schedule.loaded_once = true;
        }

        info!(
            banner_id = %self.id,
            ad_unit = %self.config.ad_unit,
            generation,
            campaign_id = ?ad.campaign_id,
            format = %spec.format,
            width = spec.width,
            height = spec.height,
            "banner loaded"
        );
        if self.config.beacon {
            self.services
                .beacons
                .send_on_load(&self.config.ad_unit, ad.campaign_id.as_deref());
        }
        Ok(LoadOutcome::Loaded(ad))
    }

    /// Moves to `Error` if `generation` is still current. Returns whether it was.
    fn mark_error(&self, generation: u64) -> bool {
        let mut inner = self.inner();
        if inner.disposed || generation != inner.issued {
            return false;
        }
        inner.state.phase = BannerPhase::Error;
        true
    }

    async fn record(&self, entry: BannerLog) {
        if let Some(events) = &self.events {
            events.record(entry).await;
        }
    }
}

impl Drop for AdLifecycleController {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.inner).schedule.timer.take() {
            timer.abort();
        }
    }
}
