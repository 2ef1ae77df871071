// src/banner/click.rs

use crate::content::BeaconSink;
use crate::host::{UrlOpener, XrSession};
use crate::model::{BannerState, CampaignAd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing loaded yet, nothing to open.
    NoBanner,
    Navigated,
    /// Navigated once the XR session finished ending.
    NavigatedAfterXr,
    /// An XR teardown for an earlier click is still running.
    Pending,
}

impl ClickOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClickOutcome::NoBanner => "no_banner",
            ClickOutcome::Navigated => "navigated",
            ClickOutcome::NavigatedAfterXr => "navigated_after_xr",
            ClickOutcome::Pending => "pending",
        }
    }
}

/// Resets the pending flag even if the click future is dropped mid-teardown.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Turns a user activation into navigation and a click beacon.
pub struct ClickDispatcher {
    ad_unit: String,
    beacon: bool,
    beacons: Arc<dyn BeaconSink>,
    opener: Arc<dyn UrlOpener>,
    xr: Option<Arc<dyn XrSession>>,
    pending: AtomicBool,
}

impl ClickDispatcher {
    pub fn new(
        ad_unit: &str,
        beacon: bool,
        beacons: Arc<dyn BeaconSink>,
        opener: Arc<dyn UrlOpener>,
        xr: Option<Arc<dyn XrSession>>,
    ) -> Self {
        Self {
            ad_unit: ad_unit.to_string(),
            beacon,
            beacons,
            opener,
            xr,
            pending: AtomicBool::new(false),
        }
    }

    /// Handles one activation of the banner.
    ///
    /// With an active XR session the session is ended first and navigation
    /// waits for it; the end of the session is the only trigger, so clicks
    /// that arrive meanwhile are dropped.
    pub async fn on_activate(&self, state: &BannerState) -> ClickOutcome {
        let Some(ad) = state.ad.clone() else {
            debug!(ad_unit = %self.ad_unit, "click ignored, no banner loaded");
            return ClickOutcome::NoBanner;
        };
        if self.pending.swap(true, Ordering::SeqCst) {
            debug!(ad_unit = %self.ad_unit, "click ignored, xr session is ending");
            return ClickOutcome::Pending;
        }
        let _guard = PendingGuard(&self.pending);

        match self.xr.as_ref().filter(|xr| xr.is_active()) {
            Some(xr) => {
                info!(ad_unit = %self.ad_unit, "ending xr session before navigation");
                xr.end().await;
                self.execute(&ad);
                ClickOutcome::NavigatedAfterXr
            }
            None => {
                self.execute(&ad);
                ClickOutcome::Navigated
            }
        }
    }

    fn execute(&self, ad: &CampaignAd) {
        info!(ad_unit = %self.ad_unit, url = %ad.url, campaign_id = ?ad.campaign_id, "banner clicked");
        self.opener.open(&ad.url);
        if self.beacon {
            self.beacons.send_on_click(&self.ad_unit, ad.campaign_id.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banner::testing::{loaded_state, RecordingBeacons};
    use crate::host::headless::RecordingOpener;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// XR session whose end resolves when the test says so.
    struct GatedXr {
        active: AtomicBool,
        release: Mutex<Option<oneshot::Receiver<()>>>,
        opener: Arc<RecordingOpener>,
        opened_at_end: Mutex<Option<usize>>,
    }

    impl XrSession for GatedXr {
        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }

        fn end(&self) -> BoxFuture<'static, ()> {
            *self.opened_at_end.lock().unwrap() = Some(self.opener.opened().len());
            let release = self.release.lock().unwrap().take();
            async move {
                if let Some(rx) = release {
                    let _ = rx.await;
                }
            }
            .boxed()
        }
    }

    fn dispatcher(
        xr: Option<Arc<dyn XrSession>>,
        opener: Arc<RecordingOpener>,
        beacons: Arc<RecordingBeacons>,
    ) -> ClickDispatcher {
        ClickDispatcher::new("U1", true, beacons, opener, xr)
    }

    #[tokio::test]
    async fn click_without_banner_does_nothing() {
        let opener = Arc::new(RecordingOpener::new());
        let beacons = Arc::new(RecordingBeacons::default());
        let clicks = dispatcher(None, opener.clone(), beacons.clone());

        let outcome = clicks.on_activate(&BannerState::default()).await;

        assert_eq!(outcome, ClickOutcome::NoBanner);
        assert!(opener.opened().is_empty());
        assert!(beacons.clicks().is_empty());
    }

    #[tokio::test]
    async fn click_navigates_and_beacons_with_loaded_campaign() {
        let opener = Arc::new(RecordingOpener::new());
        let beacons = Arc::new(RecordingBeacons::default());
        let clicks = dispatcher(None, opener.clone(), beacons.clone());

        let outcome = clicks.on_activate(&loaded_state("https://example.com/x", Some("C1"))).await;

        assert_eq!(outcome, ClickOutcome::Navigated);
        assert_eq!(opener.opened(), vec!["https://example.com/x".to_string()]);
        assert_eq!(beacons.clicks(), vec![("U1".to_string(), Some("C1".to_string()))]);
    }

    #[tokio::test]
    async fn beacon_disabled_still_navigates() {
        let opener = Arc::new(RecordingOpener::new());
        let beacons = Arc::new(RecordingBeacons::default());
        let clicks = ClickDispatcher::new("U1", false, beacons.clone(), opener.clone(), None);

        clicks.on_activate(&loaded_state("https://example.com/x", Some("C1"))).await;

        assert_eq!(opener.opened().len(), 1);
        assert!(beacons.clicks().is_empty());
    }

    #[tokio::test]
    async fn xr_session_ends_before_single_navigation() {
        let opener = Arc::new(RecordingOpener::new());
        let beacons = Arc::new(RecordingBeacons::default());
        let (release, gate) = oneshot::channel();
        let xr = Arc::new(GatedXr {
            active: AtomicBool::new(true),
            release: Mutex::new(Some(gate)),
            opener: opener.clone(),
            opened_at_end: Mutex::new(None),
        });
        let clicks = Arc::new(dispatcher(Some(xr.clone()), opener.clone(), beacons.clone()));
        let state = loaded_state("https://example.com/x", Some("C1"));

        let first = tokio::spawn({
            let clicks = clicks.clone();
            let state = state.clone();
            async move { clicks.on_activate(&state).await }
        });
        while xr.opened_at_end.lock().unwrap().is_none() {
            tokio::task::yield_now().await;
        }

        // Second click while the session is still ending.
        assert_eq!(clicks.on_activate(&state).await, ClickOutcome::Pending);
        assert!(opener.opened().is_empty());

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap(), ClickOutcome::NavigatedAfterXr);
        assert_eq!(*xr.opened_at_end.lock().unwrap(), Some(0));
        assert_eq!(opener.opened().len(), 1);
        assert_eq!(beacons.clicks().len(), 1);
    }

    #[tokio::test]
    async fn inactive_xr_session_is_not_ended() {
        let opener = Arc::new(RecordingOpener::new());
        let beacons = Arc::new(RecordingBeacons::default());
        let xr = Arc::new(GatedXr {
            active: AtomicBool::new(false),
            release: Mutex::new(None),
            opener: opener.clone(),
            opened_at_end: Mutex::new(None),
        });
        let clicks = dispatcher(Some(xr.clone()), opener.clone(), beacons);

        let outcome = clicks.on_activate(&loaded_state("https://example.com/x", None)).await;

        assert_eq!(outcome, ClickOutcome::Navigated);
        assert!(xr.opened_at_end.lock().unwrap().is_none());
    }
}
