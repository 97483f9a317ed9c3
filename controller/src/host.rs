use std::{
    collections::HashMap,
    net::SocketAddr,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{mpsc, Mutex},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use sleepfade_common::{
    parse_target_topic, parse_value_payload, SleepTimerEngine, TimerAction, TimerConfig,
    TimerError, TimerEvent, TimerMode, WeeklySchedule, WindowSpec, TOPIC_CMD_DURATION, TOPIC_CMD_PRESET,
    TOPIC_CMD_SCHEDULE, TOPIC_CMD_TIMER, TOPIC_CMD_VOLUME, TOPIC_CONTROLLER_SCHEDULE_STATE,
    TOPIC_CONTROLLER_STATE, TOPIC_TARGET_VALUE_FILTER,
};

use crate::{
    dispatch::{send_device_actions, Dispatcher, Handled},
    gateway::MqttGateway,
    store::AppStore,
    ticker::TickTimer,
};

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Mutex<Dispatcher>>,
    device_actions: mpsc::UnboundedSender<Vec<TimerAction>>,
    timezone: Arc<Mutex<String>>,
    time_synced: Arc<AtomicBool>,
    mqtt: AsyncClient,
    store: AppStore,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
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
    #[serde(rename = "tickIntervalMs")]
    tick_interval_ms: u64,
}

const MAX_MQTT_PAYLOAD_BYTES: usize = 2048;
const SCHEDULE_POLL_SECS: i64 = 60;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = AppStore::new();
    let mut runtime = store.load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config from store: {err:#}");
        Default::default()
    });
    runtime.sanitize();

    let schedule = store
        .load_schedule()
        .await
        .unwrap_or_else(|err| {
            warn!("failed to load schedule from store: {err:#}");
            None
        })
        .map(|mut schedule| {
            schedule.normalize();
            schedule
        });

    let timer_state = store.load_timer_state().await.unwrap_or_else(|err| {
        warn!("failed to load timer state from store: {err:#}");
        Default::default()
    });

    let engine = SleepTimerEngine::new(
        runtime.timer.clone(),
        runtime.settings.clone(),
        timer_state,
    );

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or(runtime.network.mqtt_host.clone());
    let mqtt_port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(runtime.network.mqtt_port);

    let mut mqtt_options = MqttOptions::new("sleepfade-controller", mqtt_host, mqtt_port);
    let mqtt_user = std::env::var("MQTT_USER").unwrap_or(runtime.network.mqtt_user.clone());
    let mqtt_pass = std::env::var("MQTT_PASS").unwrap_or(runtime.network.mqtt_pass.clone());
    if !mqtt_user.is_empty() {
        mqtt_options.set_credentials(mqtt_user, mqtt_pass);
    }

    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);
    let (tick_tx, tick_rx) = mpsc::unbounded_channel();
    let (actions_tx, actions_rx) = mpsc::unbounded_channel();

    let dispatcher = Dispatcher::new(engine, TickTimer::new(tick_tx), schedule);

    let app_state = AppState {
        dispatcher: Arc::new(Mutex::new(dispatcher)),
        device_actions: actions_tx,
        timezone: Arc::new(Mutex::new(runtime.timezone)),
        time_synced: Arc::new(AtomicBool::new(false)),
        mqtt,
        store,
    };

    subscribe_topics(&app_state.mqtt).await?;
    spawn_mqtt_loop(app_state.clone(), eventloop);
    spawn_device_action_loop(MqttGateway::new(app_state.mqtt.clone()), actions_rx);
    spawn_tick_loop(app_state.clone(), tick_rx);
    spawn_schedule_loop(app_state.clone());
    spawn_state_publish_loop(app_state.clone());

    if let Err(err) = dispatch_event(&app_state, TimerEvent::KernelReady).await {
        warn!("resuming persisted timer failed: {err}");
    }

    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/timer", post(handle_set_timer))
        .route("/api/volume", post(handle_set_volume))
        .route("/api/preset", post(handle_set_preset))
        .route("/api/duration", post(handle_set_duration))
        .route(
            "/api/schedule",
            get(handle_get_schedule)
                .put(handle_put_schedule)
                .delete(handle_delete_schedule),
        )
        .route("/api/schedule/profiles", post(handle_schedule_from_profiles))
        .route("/api/schedule/active", post(handle_set_schedule_active))
        .route("/api/config", get(handle_get_config).put(handle_put_config))
        .route("/api/time", get(handle_get_time))
        .route("/api/timezone", put(handle_put_timezone))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let port = std::env::var("SLEEPFADE_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind controller server at {addr}"))?;

    info!("controller listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn subscribe_topics(mqtt: &AsyncClient) -> anyhow::Result<()> {
    let topics = [
        TOPIC_TARGET_VALUE_FILTER,
        TOPIC_CMD_TIMER,
        TOPIC_CMD_VOLUME,
        TOPIC_CMD_PRESET,
        TOPIC_CMD_DURATION,
        TOPIC_CMD_SCHEDULE,
    ];

    for topic in topics {
        mqtt.subscribe(topic, QoS::AtLeastOnce).await?;
    }
    Ok(())
}

fn spawn_mqtt_loop(app_state: AppState, mut eventloop: rumqttc::EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if let Err(err) =
                        handle_mqtt_message(&app_state, message.topic, message.payload.to_vec())
                            .await
                    {
                        warn!("mqtt message handling error: {err:#}");
                    }
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

fn spawn_tick_loop(app_state: AppState, mut ticks: mpsc::UnboundedReceiver<u64>) {
    tokio::spawn(async move {
        while let Some(generation) = ticks.recv().await {
            let now = local_now(&app_state).await;
            let handled = {
                let mut dispatcher = app_state.dispatcher.lock().await;
                dispatcher.on_tick_fired(generation, now)
            };
            match handled {
                Ok(handled) => complete_handled(&app_state, handled).await,
                Err(err) => warn!("decay tick failed: {err}"),
            }
        }
    });
}

/// Sends device commands in the order they were planned. Runs apart from the
/// dispatcher lock and the MQTT poll loop, so restore pauses hold up neither.
fn spawn_device_action_loop(
    gateway: MqttGateway,
    mut batches: mpsc::UnboundedReceiver<Vec<TimerAction>>,
) {
    tokio::spawn(async move {
        while let Some(actions) = batches.recv().await {
            send_device_actions(&gateway, actions).await;
        }
    });
}

/// Sleeps until the next schedule point and fires each point once.
fn spawn_schedule_loop(app_state: AppState) {
    tokio::spawn(async move {
        let mut pending: Option<i64> = None;

        loop {
            let now = local_now(&app_state).await;

            if let Some(epoch) = pending.filter(|epoch| now.timestamp() >= *epoch) {
                debug!("schedule point {epoch} reached");
                if let Err(err) = dispatch_event(&app_state, TimerEvent::ScheduleFired).await {
                    warn!("schedule event failed: {err}");
                }
            }

            pending = {
                let dispatcher = app_state.dispatcher.lock().await;
                dispatcher.next_schedule_epoch(now)
            };
            let wait = pending
                .map(|epoch| (epoch - now.timestamp()).clamp(1, SCHEDULE_POLL_SECS))
                .unwrap_or(SCHEDULE_POLL_SECS);
            tokio::time::sleep(Duration::from_secs(wait.unsigned_abs())).await;
        }
    });
}

fn spawn_state_publish_loop(app_state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10));
        loop {
            interval.tick().await;

            let now = local_now(&app_state).await;
            let (payload, schedule_payload) = {
                let dispatcher = app_state.dispatcher.lock().await;
                (
                    serde_json::to_vec(&dispatcher.engine().state_payload(now)),
                    serde_json::to_vec(&dispatcher.schedule()),
                )
            };

            match payload {
                Ok(body) => {
                    if let Err(err) = app_state
                        .mqtt
                        .publish(TOPIC_CONTROLLER_STATE, QoS::AtLeastOnce, true, body)
                        .await
                    {
                        warn!("controller state publish failed: {err}");
                    }
                }
                Err(err) => warn!("controller state serialization failed: {err}"),
            }

            match schedule_payload {
                Ok(body) => {
                    if let Err(err) = app_state
                        .mqtt
                        .publish(
                            TOPIC_CONTROLLER_SCHEDULE_STATE,
                            QoS::AtLeastOnce,
                            true,
                            body,
                        )
                        .await
                    {
                        warn!("schedule state publish failed: {err}");
                    }
                }
                Err(err) => warn!("schedule serialization failed: {err}"),
            }
        }
    });
}

async fn dispatch_event(app_state: &AppState, event: TimerEvent) -> Result<(), TimerError> {
    let now = local_now(app_state).await;
    let handled = {
        let mut dispatcher = app_state.dispatcher.lock().await;
        dispatcher.handle(event, now)?
    };
    complete_handled(app_state, handled).await;
    Ok(())
}

/// Queues planned device actions and persists a changed timer state. Called
/// after the dispatcher lock is released.
async fn complete_handled(app_state: &AppState, handled: Handled) {
    if !handled.actions.is_empty() && app_state.device_actions.send(handled.actions).is_err() {
        warn!("device action loop stopped, dropping commands");
    }
    if handled.changed {
        persist_timer_state(app_state).await;
    }
}

async fn handle_mqtt_message(
    app_state: &AppState,
    topic: String,
    payload: Vec<u8>,
) -> anyhow::Result<()> {
    if payload.len() > MAX_MQTT_PAYLOAD_BYTES {
        warn!(
            "dropping oversized MQTT payload on topic {} ({} bytes)",
            topic,
            payload.len()
        );
        return Ok(());
    }

    let message = String::from_utf8(payload).context("non utf8 mqtt payload")?;

    if let Some(target) = parse_target_topic(&topic, "value") {
        let Some(value) = parse_value_payload(&message) else {
            debug!("ignoring unreadable value {message:?} from target {target}");
            return Ok(());
        };
        let handled = app_state
            .dispatcher
            .lock()
            .await
            .on_device_value(target, value);
        complete_handled(app_state, handled).await;
        return Ok(());
    }

    match topic.as_str() {
        TOPIC_CMD_TIMER => {
            let Some(on) = parse_switch(&message) else {
                return Ok(());
            };
            let event = TimerEvent::Toggle {
                on,
                mode: TimerMode::Manual,
            };
            if let Err(err) = dispatch_event(app_state, event).await {
                warn!("timer command refused: {err}");
            }
        }
        TOPIC_CMD_VOLUME | TOPIC_CMD_PRESET | TOPIC_CMD_DURATION => {
            let Ok(value) = message.trim().parse::<u16>() else {
                return Ok(());
            };
            let result = {
                let mut dispatcher = app_state.dispatcher.lock().await;
                match topic.as_str() {
                    TOPIC_CMD_VOLUME => dispatcher.set_volume(saturate_u8(value)),
                    TOPIC_CMD_PRESET => dispatcher.set_preset(saturate_u8(value)),
                    _ => dispatcher.set_duration(value),
                }
            };
            match result {
                Ok(true) => persist_runtime_from_state(app_state).await?,
                Ok(false) => {}
                Err(err) => warn!("setting on {topic} refused: {err}"),
            }
        }
        TOPIC_CMD_SCHEDULE => {
            if message.trim().eq_ignore_ascii_case("delete") {
                replace_schedule(app_state, None).await?;
                return Ok(());
            }
            let specs = serde_json::from_str::<Vec<WindowSpec>>(&message)
                .context("invalid schedule payload")?;
            match WeeklySchedule::create_or_replace(&specs) {
                Ok(schedule) => replace_schedule(app_state, Some(schedule)).await?,
                Err(err) => warn!("schedule rejected: {err}"),
            }
        }
        _ => {}
    }

    Ok(())
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    let now = local_now(&state).await;
    let timezone = state.timezone.lock().await.clone();
    let time_synced = state.time_synced.load(Ordering::Relaxed);

    let status = {
        let dispatcher = state.dispatcher.lock().await;
        let schedule_active = dispatcher.schedule().is_some_and(|schedule| schedule.active);
        dispatcher.engine().status(
            now,
            schedule_active,
            dispatcher.next_schedule_epoch(now),
            time_synced,
            &timezone,
        )
    };

    Json(status)
}

async fn handle_set_timer(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(on) = params.get("value").and_then(|value| parse_switch(value)) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid 'value'. Use 'on' or 'off'");
    };
    let mode = match params.get("mode").map(|mode| mode.to_ascii_lowercase()) {
        None => TimerMode::Manual,
        Some(mode) if mode == "manual" => TimerMode::Manual,
        Some(mode) if mode == "scheduled" => TimerMode::Scheduled,
        Some(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid mode. Use 'manual' or 'scheduled'",
            )
        }
    };

    if let Err(err) = dispatch_event(&state, TimerEvent::Toggle { on, mode }).await {
        return timer_error_response(err);
    }

    handle_get_status(State(state)).await.into_response()
}

async fn handle_set_volume(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let volume = match parse_value_param::<u16>(&params, "Invalid volume value") {
        Ok(volume) => saturate_u8(volume),
        Err(response) => return response,
    };
    let result = state.dispatcher.lock().await.set_volume(volume);
    finish_setting_update(state, result).await
}

async fn handle_set_preset(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let preset = match parse_value_param::<u8>(&params, "Invalid preset value (0-6)") {
        Ok(preset) => preset,
        Err(response) => return response,
    };
    let result = state.dispatcher.lock().await.set_preset(preset);
    finish_setting_update(state, result).await
}

async fn handle_set_duration(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let minutes = match parse_value_param::<u16>(&params, "Invalid duration value (15-120)") {
        Ok(minutes) => minutes,
        Err(response) => return response,
    };
    let result = state.dispatcher.lock().await.set_duration(minutes);
    finish_setting_update(state, result).await
}

async fn finish_setting_update(
    state: AppState,
    result: Result<bool, TimerError>,
) -> axum::response::Response {
    match result {
        Ok(true) => {
            if let Err(err) = persist_runtime_from_state(&state).await {
                warn!("failed to persist settings update: {err:#}");
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to persist runtime settings",
                );
            }
        }
        Ok(false) => {}
        Err(err) => return timer_error_response(err),
    }

    handle_get_status(State(state)).await.into_response()
}

async fn handle_get_schedule(State(state): State<AppState>) -> impl IntoResponse {
    let schedule = state.dispatcher.lock().await.schedule().cloned();
    Json(schedule)
}

async fn handle_put_schedule(
    State(state): State<AppState>,
    Json(specs): Json<Vec<WindowSpec>>,
) -> impl IntoResponse {
    match WeeklySchedule::create_or_replace(&specs) {
        Ok(schedule) => finish_schedule_update(state, Some(schedule)).await,
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

async fn handle_delete_schedule(State(state): State<AppState>) -> impl IntoResponse {
    finish_schedule_update(state, None).await
}

async fn handle_schedule_from_profiles(State(state): State<AppState>) -> impl IntoResponse {
    let specs = state.dispatcher.lock().await.engine().config.profile_windows();
    match WeeklySchedule::create_or_replace(&specs) {
        Ok(schedule) => finish_schedule_update(state, Some(schedule)).await,
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

async fn handle_set_schedule_active(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(active) = params.get("value").and_then(|value| parse_switch(value)) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid 'value'. Use 'on' or 'off'");
    };

    let (changed, schedule) = {
        let mut dispatcher = state.dispatcher.lock().await;
        (
            dispatcher.set_schedule_active(active),
            dispatcher.schedule().cloned(),
        )
    };
    match changed {
        None => error_response(StatusCode::NOT_FOUND, "No schedule configured"),
        Some(false) => Json(schedule).into_response(),
        Some(true) => {
            if let Err(err) = state.store.save_schedule(schedule.as_ref()).await {
                warn!("failed to persist schedule flag: {err:#}");
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to persist schedule",
                );
            }
            Json(schedule).into_response()
        }
    }
}

async fn finish_schedule_update(
    state: AppState,
    schedule: Option<WeeklySchedule>,
) -> axum::response::Response {
    if let Err(err) = replace_schedule(&state, schedule).await {
        warn!("failed to persist schedule update: {err:#}");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to persist schedule",
        );
    }

    handle_get_schedule(State(state)).await.into_response()
}

async fn replace_schedule(
    state: &AppState,
    schedule: Option<WeeklySchedule>,
) -> anyhow::Result<()> {
    match &schedule {
        Some(schedule) => info!("weekly schedule replaced ({} groups)", schedule.groups.len()),
        None => info!("weekly schedule deleted"),
    }
    state.store.save_schedule(schedule.as_ref()).await?;
    state.dispatcher.lock().await.set_schedule(schedule);
    Ok(())
}

async fn handle_get_config(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.dispatcher.lock().await.engine().config.clone();
    Json(config)
}

async fn handle_put_config(
    State(state): State<AppState>,
    Json(config): Json<TimerConfig>,
) -> impl IntoResponse {
    let result = state.dispatcher.lock().await.replace_config(config);
    if let Err(err) = result {
        return timer_error_response(err);
    }

    if let Err(err) = persist_runtime_from_state(&state).await {
        warn!("failed to persist config update: {err:#}");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to persist runtime settings",
        );
    }

    handle_get_config(State(state)).await.into_response()
}

async fn handle_get_time(State(state): State<AppState>) -> impl IntoResponse {
    let timezone = state.timezone.lock().await.clone();
    let tick_interval_ms = state.dispatcher.lock().await.tick_interval_ms();
    Json(TimeStatus {
        time_synced: state.time_synced.load(Ordering::Relaxed),
        timezone,
        now_epoch: Utc::now().timestamp(),
        tick_interval_ms,
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
    let (timer, settings) = {
        let dispatcher = state.dispatcher.lock().await;
        let engine = dispatcher.engine();
        (engine.config.clone(), engine.settings().clone())
    };
    let timezone = state.timezone.lock().await.clone();

    let mut runtime = state.store.load_runtime_config().await?;
    runtime.timer = timer;
    runtime.settings = settings;
    runtime.timezone = timezone;
    state.store.save_runtime_config(&runtime).await
}

async fn persist_timer_state(state: &AppState) {
    let timer_state = state.dispatcher.lock().await.engine().state().clone();
    if let Err(err) = state.store.save_timer_state(&timer_state).await {
        warn!("failed to persist timer state: {err:#}");
    }
}

async fn local_now(state: &AppState) -> DateTime<FixedOffset> {
    let timezone = state.timezone.lock().await.clone();
    let now = now_in_timezone(&timezone);
    state.time_synced.store(now.is_some(), Ordering::Relaxed);
    now.unwrap_or_else(|| Utc::now().fixed_offset())
}

fn now_in_timezone(timezone: &str) -> Option<DateTime<FixedOffset>> {
    let tz: Tz = timezone.parse().ok()?;
    let local = Utc::now().with_timezone(&tz);
    Some(local.with_timezone(&local.offset().fix()))
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "1" | "true" => Some(true),
        "off" | "0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_value_param<T: FromStr>(
    params: &HashMap<String, String>,
    invalid: &str,
) -> Result<T, axum::response::Response> {
    let Some(value) = params.get("value") else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing 'value' parameter",
        ));
    };
    value
        .trim()
        .parse::<T>()
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, invalid))
}

fn saturate_u8(value: u16) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

fn timer_error_response(err: TimerError) -> axum::response::Response {
    match err {
        TimerError::ConfigurationMissing(_) | TimerError::ControlsLocked => {
            error_response(StatusCode::CONFLICT, &err.to_string())
        }
    }
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
