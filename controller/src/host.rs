use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{debug, info, warn};

use trv_common::{
    expand_temp_c16, AmbientLight, EngineAction, MemoryStatsStore, RuntimeConfig, Schedule,
    Sensor, SetpointError, Statistics, StatsSet, TickInput, TrvEngine, TrvStatus, ValveActuator,
    STATS_UNSET_BYTE,
};
use trv_sensor::{
    AmbientLightSensor, PotAction, RoomModel, SharedAnalogue, SimulatedRoom, TemperaturePot,
    VoiceDetection, VoiceInterrupt,
};

use crate::store::AppStore;

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<TrvEngine>>,
    room: Arc<Mutex<SimulatedRoom>>,
    pot: Option<SharedAnalogue>,
    voice: VoiceInterrupt,
    timezone: Arc<Mutex<String>>,
    time_synced: Arc<AtomicBool>,
    store: AppStore,
}

/// Conditioned inputs polled by the control loop only.
struct SensorSuite {
    ambient: AmbientLightSensor<SharedAnalogue>,
    pot: Option<TemperaturePot<SharedAnalogue>>,
    voice: VoiceDetection,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HostStatus {
    #[serde(flatten)]
    trv: TrvStatus,
    #[serde(rename = "timeSynced")]
    time_synced: bool,
    timezone: String,
    #[serde(rename = "nextScheduleStartEpoch")]
    next_schedule_start_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TimezoneUpdate {
    timezone: String,
}

#[derive(Debug, Serialize)]
struct TimeStatus {
    #[serde(rename = "timeSynced")]
    time_synced: bool,
    timezone: String,
    #[serde(rename = "nowEpoch")]
    now_epoch: i64,
}

#[derive(Debug, Serialize)]
struct StatsView {
    set: StatsSet,
    /// Raw bytes by hour; `null` where unset.
    values: Vec<Option<u8>>,
    /// Expanded 1/16 C values for the temperature sets.
    #[serde(rename = "tempC16", skip_serializing_if = "Option::is_none")]
    temp_c16: Option<Vec<Option<i16>>>,
}

#[derive(Debug, Serialize)]
struct QuartileView {
    set: StatsSet,
    hour: u8,
    top: bool,
    #[serde(rename = "inQuartile")]
    in_quartile: bool,
}

#[derive(Debug, Serialize)]
struct PredictView {
    hour: u8,
    #[serde(rename = "shouldBeWarmed")]
    should_be_warmed: bool,
}

#[derive(Debug, Serialize)]
struct SimView {
    model: RoomModel,
    #[serde(rename = "roomTempC")]
    room_temp_c: f32,
    #[serde(rename = "valvePc")]
    valve_pc: u8,
    #[serde(rename = "reallyOpen")]
    really_open: bool,
    #[serde(rename = "sensorFault")]
    sensor_fault: bool,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = AppStore::from_env();
    let runtime = store.load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config from store: {err:#}");
        RuntimeConfig::default()
    });
    let stats_store = store.load_stats().await.unwrap_or_else(|err| {
        warn!("failed to load stats from store: {err:#}");
        MemoryStatsStore::new()
    });

    let mut engine = TrvEngine::new(&runtime, Statistics::new(stats_store))
        .context("invalid TRV configuration")?;
    let occupancy = engine.occupancy_events();

    let room_model = match std::env::var("TRV_ROOM_MODEL") {
        Ok(raw) => serde_json::from_str::<RoomModel>(&raw).context("invalid TRV_ROOM_MODEL")?,
        Err(_) => RoomModel::default(),
    };
    let initial_c = env_parse::<f32>("TRV_ROOM_INITIAL_C").unwrap_or(16.0);
    let room = SimulatedRoom::new(room_model, initial_c, sim_seed());

    let pot_input = env_flag("TRV_TEMP_POT").then(|| SharedAnalogue::new(512));
    let pot = pot_input.clone().map(|input| {
        let pot = TemperaturePot::new(input);
        info!("warm target follows the temperature dial");
        pot
    });
    if let Some(pot) = &pot {
        let targets = pot.targets(engine.config());
        engine = engine.with_targets(Box::new(targets));
    }

    let voice = VoiceDetection::new(occupancy.clone());
    let sensors = SensorSuite {
        ambient: AmbientLightSensor::new(room.light(), occupancy),
        pot,
        voice,
    };

    let app_state = AppState {
        engine: Arc::new(Mutex::new(engine)),
        room: Arc::new(Mutex::new(room)),
        pot: pot_input,
        voice: sensors.voice.interrupt_handle(),
        timezone: Arc::new(Mutex::new(runtime.timezone)),
        time_synced: Arc::new(AtomicBool::new(false)),
        store,
    };

    spawn_control_loop(app_state.clone(), sensors);

    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/mode", post(handle_set_mode))
        .route("/api/bake/start", post(handle_bake_start))
        .route("/api/bake/cancel", post(handle_bake_cancel))
        .route("/api/occupancy", post(handle_occupancy))
        .route(
            "/api/valve/min",
            get(handle_get_valve_min).post(handle_set_valve_min),
        )
        .route("/api/glacial", post(handle_set_glacial))
        .route("/api/target/frost", post(handle_set_frost_target))
        .route("/api/target/warm", post(handle_set_warm_target))
        .route(
            "/api/schedule",
            get(handle_get_schedule).put(handle_put_schedule),
        )
        .route("/api/stats/predict", get(handle_get_predict))
        .route("/api/stats/zap", post(handle_zap_stats))
        .route("/api/stats/{set}", get(handle_get_stats))
        .route("/api/stats/{set}/quartile", get(handle_get_quartile))
        .route("/api/pot", post(handle_set_pot))
        .route("/api/sim", get(handle_get_sim))
        .route("/api/sim/fault", post(handle_set_sim_fault))
        .route("/api/time", get(handle_get_time))
        .route("/api/timezone", put(handle_put_timezone))
        .with_state(app_state.clone());

    let port = env_parse::<u16>("TRV_HTTP_PORT").unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind TRV server at {addr}"))?;

    info!("TRV controller listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(err) = persist_stats_from_state(&app_state).await {
        warn!("failed to persist stats on shutdown: {err:#}");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err:#}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn spawn_control_loop(app_state: AppState, mut sensors: SensorSuite) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(until_next_minute(Utc::now())).await;

            let timezone = { app_state.timezone.lock().await.clone() };
            let now_in_tz = now_in_timezone(&timezone);
            app_state
                .time_synced
                .store(now_in_tz.is_some(), Ordering::Relaxed);
            let now = now_in_tz.unwrap_or_else(|| Utc::now().fixed_offset());
            let (hour, minute) = (now.hour() as u8, now.minute() as u8);

            let temp_c16 = {
                let mut room = app_state.room.lock().await;
                room.step_minute(hour);
                room.read()
            };
            let light = sensors.ambient.read();
            let room_lit = sensors.ambient.is_room_lit();
            sensors.voice.read();
            let pot_action = sensors.pot.as_mut().and_then(|pot| {
                pot.read();
                pot.take_action()
            });

            let (actions, stats_dirty) = {
                let mut engine = app_state.engine.lock().await;
                if let Some(action) = pot_action {
                    apply_pot_action(&mut engine, action);
                }
                let actions = engine.tick(TickInput {
                    temp_c16,
                    ambient_light: Some(light),
                    room_lit,
                    hour,
                    minute,
                });
                (actions, engine.stats_mut().take_dirty())
            };

            if !actions.is_empty() {
                execute_engine_actions(&app_state, actions).await;
            }

            if stats_dirty {
                if let Err(err) = persist_stats_from_state(&app_state).await {
                    warn!("failed to persist stats: {err:#}");
                }
            }
            if pot_action.is_some() {
                if let Err(err) = persist_runtime_from_state(&app_state).await {
                    warn!("failed to persist dial change: {err:#}");
                }
            }
        }
    });
}

fn apply_pot_action(engine: &mut TrvEngine, action: PotAction) {
    info!(?action, "dial action");
    action.apply(engine);
}

async fn execute_engine_actions(state: &AppState, actions: Vec<EngineAction>) {
    for action in actions {
        match action {
            EngineAction::SetValvePercent(percent) => {
                let mut room = state.room.lock().await;
                room.set_percent_open(percent);
                debug!(percent, really_open = room.is_really_open(), "valve driven");
            }
            EngineAction::CallForHeat(calling) => {
                info!(calling, "boiler call for heat");
            }
        }
    }
}

async fn host_status(state: &AppState) -> HostStatus {
    let timezone = state.timezone.lock().await.clone();
    let (trv, next_schedule_start_epoch) = {
        let engine = state.engine.lock().await;
        let next = now_in_timezone(&timezone)
            .and_then(|now| engine.schedule().next_start_epoch(&now));
        (engine.status(), next)
    };

    HostStatus {
        trv,
        time_synced: state.time_synced.load(Ordering::Relaxed),
        timezone,
        next_schedule_start_epoch,
    }
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(host_status(&state).await)
}

/// Recomputes the target, persists settings and replies with the new status.
async fn settings_changed(state: AppState, context: &str) -> axum::response::Response {
    {
        let mut engine = state.engine.lock().await;
        engine.compute_target_temperature();
    }
    if let Err(err) = persist_runtime_from_state(&state).await {
        warn!("failed to persist {context}: {err:#}");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to persist runtime settings",
        );
    }
    handle_get_status(State(state)).await.into_response()
}

async fn handle_set_mode(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };
    let Some(warm) = parse_mode(value) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid mode. Use 'WARM' or 'FROST'");
    };

    let changed = {
        let mut engine = state.engine.lock().await;
        engine.set_warm_mode(warm)
    };
    if !changed {
        return handle_get_status(State(state)).await.into_response();
    }
    settings_changed(state, "mode update").await
}

async fn handle_bake_start(State(state): State<AppState>) -> impl IntoResponse {
    let started = {
        let mut engine = state.engine.lock().await;
        engine.start_bake()
    };
    if !started {
        return error_response(StatusCode::CONFLICT, "BAKE is unavailable");
    }
    settings_changed(state, "bake start").await
}

async fn handle_bake_cancel(State(state): State<AppState>) -> impl IntoResponse {
    {
        let mut engine = state.engine.lock().await;
        engine.cancel_bake();
        engine.compute_target_temperature();
    }
    handle_get_status(State(state)).await.into_response()
}

async fn handle_occupancy(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };
    let Some(evidence) = parse_occupancy(value) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid evidence. Use 'occupied', 'possible' or 'voice'",
        );
    };

    match evidence {
        OccupancyEvidence::Occupied => state.engine.lock().await.mark_as_occupied(),
        OccupancyEvidence::Possible => state.engine.lock().await.mark_as_possibly_occupied(),
        OccupancyEvidence::Voice => {
            state.voice.handle_interrupt();
        }
    }
    {
        let mut engine = state.engine.lock().await;
        engine.compute_target_temperature();
    }
    handle_get_status(State(state)).await.into_response()
}

async fn handle_get_valve_min(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    Json(engine.valve().state().clone())
}

async fn handle_set_valve_min(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    // Out-of-range values, including 0, restore the default.
    let percent = match params.get("value").map(|value| value.parse::<u8>()) {
        Some(Ok(percent)) => percent,
        Some(Err(_)) => return error_response(StatusCode::BAD_REQUEST, "Invalid percent value"),
        None => 0,
    };
    {
        let mut engine = state.engine.lock().await;
        engine.set_min_valve_pc_really_open(percent);
    }
    settings_changed(state, "valve minimum").await
}

async fn handle_set_glacial(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(Ok(glacial)) = params.get("value").map(|value| value.parse::<bool>()) else {
        return error_response(StatusCode::BAD_REQUEST, "Use value=true or value=false");
    };
    {
        let mut engine = state.engine.lock().await;
        engine.set_glacial_mode(glacial);
    }
    settings_changed(state, "glacial mode").await
}

async fn handle_set_frost_target(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    set_target(state, params, true).await
}

async fn handle_set_warm_target(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    set_target(state, params, false).await
}

async fn set_target(
    state: AppState,
    params: HashMap<String, String>,
    frost: bool,
) -> axum::response::Response {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };
    let Ok(temp_c) = value.parse::<u8>() else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid temperature value");
    };

    let result = {
        let mut engine = state.engine.lock().await;
        if frost {
            engine.set_frost_target_c(temp_c)
        } else {
            engine.set_warm_target_c(temp_c)
        }
    };
    match result {
        Ok(()) => settings_changed(state, "target update").await,
        Err(err) => error_response(setpoint_status(&err), &err.to_string()),
    }
}

fn setpoint_status(err: &SetpointError) -> StatusCode {
    match err {
        SetpointError::NotSettable => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

async fn handle_get_schedule(State(state): State<AppState>) -> impl IntoResponse {
    let schedule = state.engine.lock().await.schedule().clone();
    Json(schedule)
}

async fn handle_put_schedule(
    State(state): State<AppState>,
    Json(mut schedule): Json<Schedule>,
) -> impl IntoResponse {
    schedule.normalize();
    {
        let mut engine = state.engine.lock().await;
        while engine.schedule().is_any_set() {
            engine.clear_schedule_programme(0);
        }
        for (which, programme) in schedule.programmes.iter().enumerate() {
            engine.set_schedule_programme(which, programme.start_minutes);
        }
    }

    if let Err(err) = persist_runtime_from_state(&state).await {
        warn!("failed to persist schedule update: {err:#}");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to persist schedule",
        );
    }

    handle_get_schedule(State(state)).await.into_response()
}

async fn handle_get_stats(
    State(state): State<AppState>,
    Path(set): Path<String>,
) -> impl IntoResponse {
    let Some(set) = parse_stats_set(&set) else {
        return error_response(StatusCode::NOT_FOUND, "Unknown stats set");
    };
    let engine = state.engine.lock().await;
    Json(stats_view(set, |hour| engine.stats().get_by_hour_stat(hour, set))).into_response()
}

async fn handle_get_quartile(
    State(state): State<AppState>,
    Path(set): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(set) = parse_stats_set(&set) else {
        return error_response(StatusCode::NOT_FOUND, "Unknown stats set");
    };
    let top = params.get("top").map(|value| value == "true").unwrap_or(true);
    let engine = state.engine.lock().await;
    let Some(hour) = hour_param(&params, engine.stats().current_hour()) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid hour");
    };
    Json(QuartileView {
        set,
        hour,
        top,
        in_quartile: engine.stats().in_outlier_quartile(top, set, Some(hour)),
    })
    .into_response()
}

async fn handle_get_predict(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    let Some(hour) = hour_param(&params, engine.stats().current_hour()) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid hour");
    };
    Json(PredictView {
        hour,
        should_be_warmed: engine.stats().should_be_warmed_at_hour(hour),
    })
    .into_response()
}

async fn handle_zap_stats(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let max_bytes = match params.get("max").map(|value| value.parse::<u16>()) {
        Some(Ok(max)) => max,
        Some(Err(_)) => return error_response(StatusCode::BAD_REQUEST, "Invalid byte count"),
        None => 0,
    };
    let done = {
        let mut engine = state.engine.lock().await;
        let done = engine.stats_mut().zap_stats(max_bytes);
        engine.stats_mut().take_dirty();
        done
    };
    info!(max_bytes, done, "stats zapped");

    if let Err(err) = persist_stats_from_state(&state).await {
        warn!("failed to persist zapped stats: {err:#}");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to persist stats");
    }
    Json(serde_json::json!({ "done": done })).into_response()
}

async fn handle_set_pot(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(pot) = &state.pot else {
        return error_response(StatusCode::NOT_FOUND, "No temperature dial fitted");
    };
    let Some(Ok(raw)) = params.get("value").map(|value| value.parse::<u16>()) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid dial position");
    };
    pot.set(raw);
    StatusCode::ACCEPTED.into_response()
}

async fn handle_get_sim(State(state): State<AppState>) -> impl IntoResponse {
    let room = state.room.lock().await;
    Json(SimView {
        model: *room.model(),
        room_temp_c: room.temp_c(),
        valve_pc: room.valve_pc(),
        really_open: room.is_really_open(),
        sensor_fault: room.sensor_fault(),
    })
}

async fn handle_set_sim_fault(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(Ok(fault)) = params.get("value").map(|value| value.parse::<bool>()) else {
        return error_response(StatusCode::BAD_REQUEST, "Use value=true or value=false");
    };
    {
        let mut room = state.room.lock().await;
        room.set_sensor_fault(fault);
    }
    handle_get_sim(State(state)).await.into_response()
}

async fn handle_get_time(State(state): State<AppState>) -> impl IntoResponse {
    let timezone = state.timezone.lock().await.clone();
    Json(TimeStatus {
        time_synced: state.time_synced.load(Ordering::Relaxed),
        timezone,
        now_epoch: Utc::now().timestamp(),
    })
}

async fn handle_put_timezone(
    State(state): State<AppState>,
    Json(update): Json<TimezoneUpdate>,
) -> impl IntoResponse {
    if update.timezone.parse::<Tz>().is_err() {
        return error_response(StatusCode::BAD_REQUEST, "Invalid timezone value");
    }

    {
        let mut timezone = state.timezone.lock().await;
        *timezone = update.timezone;
    }

    if let Err(err) = persist_runtime_from_state(&state).await {
        warn!("failed to persist timezone update: {err:#}");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to persist runtime settings",
        );
    }

    handle_get_time(State(state)).await.into_response()
}

async fn persist_runtime_from_state(state: &AppState) -> anyhow::Result<()> {
    let (settings, schedule) = {
        let engine = state.engine.lock().await;
        (engine.settings(), engine.schedule().clone())
    };
    let timezone = state.timezone.lock().await.clone();

    let mut runtime = state.store.load_runtime_config().await?;
    runtime.settings = settings;
    runtime.schedule = schedule;
    runtime.timezone = timezone;
    state.store.save_runtime_config(&runtime).await
}

async fn persist_stats_from_state(state: &AppState) -> anyhow::Result<()> {
    let stats = state.engine.lock().await.stats().store().clone();
    state.store.save_stats(&stats).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OccupancyEvidence {
    Occupied,
    Possible,
    Voice,
}

fn parse_mode(value: &str) -> Option<bool> {
    match value.to_ascii_uppercase().as_str() {
        "WARM" => Some(true),
        "FROST" => Some(false),
        _ => None,
    }
}

fn parse_occupancy(value: &str) -> Option<OccupancyEvidence> {
    match value.to_ascii_lowercase().as_str() {
        "occupied" => Some(OccupancyEvidence::Occupied),
        "possible" | "possibly" => Some(OccupancyEvidence::Possible),
        "voice" => Some(OccupancyEvidence::Voice),
        _ => None,
    }
}

/// `hour` query parameter, or `current_hour` (the hour the engine predicts for) when absent.
fn hour_param(params: &HashMap<String, String>, current_hour: u8) -> Option<u8> {
    match params.get("hour") {
        Some(value) => value.parse::<u8>().ok().filter(|hour| *hour < 24),
        None => Some(current_hour),
    }
}

fn parse_stats_set(value: &str) -> Option<StatsSet> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
}

fn stats_view(set: StatsSet, get: impl Fn(u8) -> u8) -> StatsView {
    let values: Vec<Option<u8>> = (0..24u8)
        .map(get)
        .map(|value| (value != STATS_UNSET_BYTE).then_some(value))
        .collect();
    let temp_c16 = matches!(set, StatsSet::TempByHour | StatsSet::TempByHourSmoothed).then(|| {
        values
            .iter()
            .map(|value| value.map(expand_temp_c16))
            .collect()
    });
    StatsView {
        set,
        values,
        temp_c16,
    }
}

/// Time left until the next wall-clock minute boundary.
fn until_next_minute(now: DateTime<Utc>) -> Duration {
    let into_minute_ms =
        u64::from(now.second()) * 1000 + u64::from(now.timestamp_subsec_millis().min(999));
    Duration::from_millis(60_000 - into_minute_ms)
}

fn now_in_timezone(timezone: &str) -> Option<DateTime<FixedOffset>> {
    let tz: Tz = timezone.parse().ok()?;
    let local = Utc::now().with_timezone(&tz);
    Some(local.with_timezone(&local.offset().fix()))
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn sim_seed() -> u64 {
    env_parse::<u64>("TRV_SIM_SEED").unwrap_or_else(|| Utc::now().timestamp() as u64)
}
