//! Map viewer state and update loop.
//!
//! [`MapViewer`] owns the current view and the drawing surface. Every update
//! takes a generation token before fetching; when the fetch resolves the
//! result is drawn only if no newer update has been issued since, so a slow
//! response can never overwrite a newer selection. A failed fetch leaves the
//! previous markers on screen.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::colors::ColorStrategy;
use crate::error::{HappyMapError, Result};
use crate::fetch::DataSource;
use crate::logging::log_error;
use crate::metrics::{MetricId, MetricRegistry};
use crate::models::{CoordinateTable, DataRow, FeatureCollection};
use crate::render::{render_markers, render_polygons, RenderSummary, RenderSurface};

/// The (year, metric) pair on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct View {
    pub year: i32,
    pub metric: MetricId,
}

/// What the map draws for a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layer {
    /// One circle marker per country
    #[default]
    Markers,
    /// Country boundary polygons
    Polygons,
}

/// Current selection with change notification
#[derive(Debug, Clone)]
pub struct Selection {
    tx: Arc<watch::Sender<Option<View>>>,
}

impl Selection {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<View> {
        *self.tx.borrow()
    }

    /// Replace the whole view
    pub fn set(&self, view: View) {
        self.tx.send_replace(Some(view));
    }

    /// Change the year, keeping the metric (the default metric if none yet)
    pub fn set_year(&self, year: i32) {
        self.tx.send_modify(|current| {
            let metric = current.map(|v| v.metric).unwrap_or_default();
            *current = Some(View { year, metric });
        });
    }

    /// Change the metric, keeping the year. No-op before a year is chosen.
    pub fn set_metric(&self, metric: MetricId) {
        self.tx.send_if_modified(|current| match current {
            Some(view) if view.metric != metric => {
                view.metric = metric;
                true
            }
            _ => false,
        });
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<Option<View>> {
        self.tx.subscribe()
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The surface now shows the view
    Applied(RenderSummary),
    /// A newer update was issued while this one was fetching
    Stale,
}

enum Fetched {
    Markers(CoordinateTable, Vec<DataRow>),
    Polygons(FeatureCollection, Vec<DataRow>),
}

/// Explicit application state for the interactive map
pub struct MapViewer<R: RenderSurface> {
    registry: Arc<MetricRegistry>,
    source: Arc<dyn DataSource>,
    surface: Arc<Mutex<R>>,
    strategy: ColorStrategy,
    layer: Layer,
    default_metric: MetricId,
    selection: Selection,
    generation: AtomicU64,
    years: Mutex<Vec<i32>>,
    displayed: Mutex<Option<View>>,
}

impl<R: RenderSurface + 'static> MapViewer<R> {
    pub fn new(
        registry: Arc<MetricRegistry>,
        source: Arc<dyn DataSource>,
        surface: Arc<Mutex<R>>,
        strategy: ColorStrategy,
    ) -> Self {
        Self {
            registry,
            source,
            surface,
            strategy,
            layer: Layer::default(),
            default_metric: MetricId::default(),
            selection: Selection::new(),
            generation: AtomicU64::new(0),
            years: Mutex::new(Vec::new()),
            displayed: Mutex::new(None),
        }
    }

    /// Draw boundary polygons instead of markers
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Metric selected by `start`
    pub fn with_default_metric(mut self, metric: MetricId) -> Self {
        self.default_metric = metric;
        self
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn surface(&self) -> &Arc<Mutex<R>> {
        &self.surface
    }

    /// Years fetched by `start`
    pub fn years(&self) -> Vec<i32> {
        self.years.lock().clone()
    }

    /// View currently drawn on the surface
    pub fn displayed(&self) -> Option<View> {
        *self.displayed.lock()
    }

    /// Fetch the year list, select the first year with the default metric,
    /// and draw it.
    pub async fn start(&self) -> Result<Vec<i32>> {
        let years = self.source.fetch_years().await.map_err(|e| {
            log_error(&e, "fetching years");
            e
        })?;
        let first = *years.first().ok_or_else(|| HappyMapError::DataNotFound {
            message: "No years available".to_string(),
        })?;
        *self.years.lock() = years.clone();

        let view = View {
            year: first,
            metric: self.default_metric,
        };
        self.selection.set(view);
        info!(year = first, metric = %view.metric, years = years.len(), "Viewer started");
        self.update(view).await?;
        Ok(years)
    }

    /// Fetch and draw one view
    pub async fn update(&self, view: View) -> Result<UpdateOutcome> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();
        let metric = self.registry.get(view.metric);
        let policy = metric.policy(self.strategy);
        debug!(token = token, year = view.year, metric = %view.metric, "Update issued");

        let fetched = match self.layer {
            Layer::Markers => futures::try_join!(
                self.source.fetch_country_coordinates(),
                self.source.fetch_table_for_year(view.year),
            )
            .map(|(coordinates, rows)| Fetched::Markers(coordinates, rows)),
            Layer::Polygons => futures::try_join!(
                self.source.fetch_boundaries(),
                self.source.fetch_table_for_year(view.year),
            )
            .map(|(boundaries, rows)| Fetched::Polygons(boundaries, rows)),
        };
        let fetched = match fetched {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = %e,
                    year = view.year,
                    metric = %view.metric,
                    "Fetch failed, keeping previous markers"
                );
                return Err(e);
            }
        };

        // Token check and redraw happen under the surface lock so a newer
        // update cannot interleave between them
        let mut surface = self.surface.lock();
        if self.generation.load(Ordering::SeqCst) != token {
            debug!(token = token, year = view.year, "Discarding stale update");
            return Ok(UpdateOutcome::Stale);
        }

        let summary = match fetched {
            Fetched::Markers(coordinates, rows) => render_markers(
                &rows,
                &coordinates,
                metric,
                policy,
                view.year,
                &mut *surface,
            )?,
            Fetched::Polygons(boundaries, rows) => render_polygons(
                &boundaries,
                &rows,
                metric,
                policy,
                view.year,
                &mut *surface,
            )?,
        };
        *self.displayed.lock() = Some(view);
        drop(surface);

        debug!(
            token = token,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Update applied"
        );
        Ok(UpdateOutcome::Applied(summary))
    }

    /// Redraw on every selection change until the viewer is dropped.
    ///
    /// Each change spawns its own update, so a new selection does not wait
    /// for an older fetch; stale results are discarded by `update`. The task
    /// holds only a weak reference, so dropping the last `Arc` ends it.
    pub fn follow(self: Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.selection.subscribe();
        let weak = Arc::downgrade(&self);
        drop(self);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let Some(view) = *rx.borrow_and_update() else {
                    continue;
                };
                let Some(viewer) = weak.upgrade() else {
                    break;
                };
                tokio::spawn(async move {
                    match viewer.update(view).await {
                        // Fetch failures are logged inside update
                        Err(HappyMapError::Fetch { .. }) => {}
                        Err(e) => log_error(&e, "redrawing selection"),
                        Ok(_) => {}
                    }
                });
            }
            debug!("Selection follower stopped");
        })
    }
}
