use std::cell::RefCell;

use clut::{DeadlineTicket, Engine, SwitchCommand, SwitchConfig, TabId};
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

mod host;
mod logging;
mod version;

use host::ChromeHost;
use version::VersionChange;

const CONFIG_KEY: &str = "clut_config";
const LOG_KEY: &str = "clut_log";
const LOG_LIMIT: usize = 40;

thread_local! {
	static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
	static ENGINE: RefCell<Option<Engine<ChromeHost>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub async fn start() {
	console_error_panic_hook::set_once();
	logging::init_logging();

	// Listeners go in before the first await so a command that woke the
	// worker is not lost.
	let engine = Engine::new(ChromeHost::new(), SwitchConfig::default());
	ENGINE.with(|e| *e.borrow_mut() = Some(engine.clone()));
	register_listeners();

	match load_config().await {
		Ok(config) => {
			logging::set_level(&config.log_level);
			engine.set_config(config);
		}
		Err(err) => {
			tracing::warn!(error = %stringify_js_error(err), "using default config");
		}
	}

	match version::check_version().await {
		Ok(VersionChange::Installed) => push_log("extension installed"),
		Ok(VersionChange::Updated { previous }) => push_log(&format!("extension updated from {previous}")),
		Ok(VersionChange::Unchanged) => {}
		Err(err) => tracing::warn!(error = %stringify_js_error(err), "version check failed"),
	}

	initialize().await;
}

fn engine() -> Option<Engine<ChromeHost>> {
	ENGINE.with(|e| e.borrow().clone())
}

async fn initialize() {
	let Some(engine) = engine() else {
		return;
	};
	match engine.initialize().await {
		Ok(tracked) => push_log(&format!("tracking {tracked} tabs")),
		Err(err) => push_log(&format!("init failed: {err}")),
	}
}

/// Reads `clut_config` from local storage. Absent config yields the defaults.
async fn load_config() -> Result<SwitchConfig, JsValue> {
	let stored = JsFuture::from(storage_local_get(&JsValue::from_str(CONFIG_KEY))).await?;
	let raw = Reflect::get(&stored, &JsValue::from_str(CONFIG_KEY))?;
	if raw.is_undefined() || raw.is_null() {
		return Ok(SwitchConfig::default());
	}
	let config: SwitchConfig = serde_wasm_bindgen::from_value(raw)?;
	config.validate().map_err(|e| JsValue::from_str(&e.to_string()))?;
	Ok(config)
}

/// Called from the deadline timer once its callback has returned.
pub(crate) fn fire_deadline(ticket: DeadlineTicket) {
	let Some(engine) = engine() else {
		return;
	};
	engine.host().forget_timer(ticket);
	if let Some(tab) = engine.on_deadline(ticket) {
		tracing::debug!(%tab, "switch finished");
	}
}

fn dispatch(command: SwitchCommand) {
	let Some(engine) = engine() else {
		return;
	};
	wasm_bindgen_futures::spawn_local(async move {
		let outcome = engine.on_command(command).await;
		tracing::debug!(%command, ?outcome, "command handled");
	});
}

fn register_listeners() {
	{
		let on_created = Closure::<dyn FnMut(JsValue)>::new(|tab: JsValue| {
			if let (Some(id), Some(engine)) = (read_i32(&tab, "id"), engine()) {
				engine.on_tab_created(TabId(id));
			}
		});
		tabs_on_created_add_listener(&on_created);
		on_created.forget();
	}

	{
		let on_removed = Closure::<dyn FnMut(JsValue, JsValue)>::new(|tab_id: JsValue, _info: JsValue| {
			if let (Some(id), Some(engine)) = (tab_id.as_f64(), engine()) {
				engine.on_tab_removed(TabId(id as i32));
			}
		});
		tabs_on_removed_add_listener(&on_removed);
		on_removed.forget();
	}

	{
		let on_activated = Closure::<dyn FnMut(JsValue)>::new(|info: JsValue| {
			if let (Some(id), Some(engine)) = (read_i32(&info, "tabId"), engine()) {
				engine.on_tab_activated(TabId(id));
			}
		});
		tabs_on_activated_add_listener(&on_activated);
		on_activated.forget();
	}

	{
		let on_command = Closure::<dyn FnMut(JsValue, JsValue)>::new(|name: JsValue, _tab: JsValue| {
			let name = name.as_string().unwrap_or_default();
			match name.parse::<SwitchCommand>() {
				Ok(command) => dispatch(command),
				Err(err) => tracing::warn!(error = %err, "ignoring command"),
			}
		});
		commands_on_command_add_listener(&on_command);
		on_command.forget();
	}

	{
		let on_clicked = Closure::<dyn FnMut(JsValue)>::new(|_tab: JsValue| {
			dispatch(SwitchCommand::Fast);
		});
		action_on_clicked_add_listener(&on_clicked);
		on_clicked.forget();
	}

	{
		let on_installed = Closure::<dyn FnMut(JsValue)>::new(|_details: JsValue| {
			wasm_bindgen_futures::spawn_local(initialize());
		});
		runtime_on_installed_add_listener(&on_installed);
		on_installed.forget();

		let on_startup = Closure::<dyn FnMut()>::new(|| {
			wasm_bindgen_futures::spawn_local(initialize());
		});
		runtime_on_startup_add_listener(&on_startup);
		on_startup.forget();
	}
}

fn read_i32(obj: &JsValue, key: &str) -> Option<i32> {
	Reflect::get(obj, &JsValue::from_str(key))
		.ok()
		.and_then(|v| v.as_f64())
		.map(|v| v as i32)
}

pub(crate) fn stringify_js_error(err: JsValue) -> String {
	err.as_string()
		.or_else(|| js_sys::JSON::stringify(&err).ok()?.as_string())
		.unwrap_or_else(|| format!("{:?}", err))
}

/// Records a lifecycle line in the bounded log mirrored to local storage.
fn push_log(line: &str) {
	tracing::info!("{line}");
	LOG.with(|log| {
		let mut vec = log.borrow_mut();
		vec.push(line.to_string());
		if vec.len() > LOG_LIMIT {
			let excess = vec.len() - LOG_LIMIT;
			vec.drain(0..excess);
		}
		persist_log(&vec);
	});
}

fn persist_log(lines: &[String]) {
	let array = Array::new();
	for line in lines {
		array.push(&JsValue::from_str(line));
	}
	let obj = Object::new();
	let _ = Reflect::set(&obj, &JsValue::from_str(LOG_KEY), &array);
	let _ = storage_local_set(&obj);
}

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = get)]
	pub(crate) fn tabs_get(tab_id: i32) -> js_sys::Promise;

	#[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = update)]
	pub(crate) fn tabs_update(tab_id: i32, props: &JsValue) -> js_sys::Promise;

	#[wasm_bindgen(js_namespace = ["chrome", "windows"], js_name = getAll)]
	pub(crate) fn windows_get_all(query: &JsValue) -> js_sys::Promise;

	#[wasm_bindgen(js_namespace = ["chrome", "windows"], js_name = update)]
	pub(crate) fn windows_update(window_id: i32, props: &JsValue) -> js_sys::Promise;

	#[wasm_bindgen(js_namespace = ["chrome", "tabs", "onCreated"], js_name = addListener)]
	fn tabs_on_created_add_listener(cb: &Closure<dyn FnMut(JsValue)>);

	#[wasm_bindgen(js_namespace = ["chrome", "tabs", "onRemoved"], js_name = addListener)]
	fn tabs_on_removed_add_listener(cb: &Closure<dyn FnMut(JsValue, JsValue)>);

	#[wasm_bindgen(js_namespace = ["chrome", "tabs", "onActivated"], js_name = addListener)]
	fn tabs_on_activated_add_listener(cb: &Closure<dyn FnMut(JsValue)>);

	#[wasm_bindgen(js_namespace = ["chrome", "commands", "onCommand"], js_name = addListener)]
	fn commands_on_command_add_listener(cb: &Closure<dyn FnMut(JsValue, JsValue)>);

	#[wasm_bindgen(js_namespace = ["chrome", "action", "onClicked"], js_name = addListener)]
	fn action_on_clicked_add_listener(cb: &Closure<dyn FnMut(JsValue)>);

	#[wasm_bindgen(js_namespace = ["chrome", "runtime", "onInstalled"], js_name = addListener)]
	fn runtime_on_installed_add_listener(cb: &Closure<dyn FnMut(JsValue)>);

	#[wasm_bindgen(js_namespace = ["chrome", "runtime", "onStartup"], js_name = addListener)]
	fn runtime_on_startup_add_listener(cb: &Closure<dyn FnMut()>);

	#[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = getManifest)]
	pub(crate) fn runtime_get_manifest() -> JsValue;

	#[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = get)]
	pub(crate) fn storage_local_get(keys: &JsValue) -> js_sys::Promise;

	#[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = set)]
	pub(crate) fn storage_local_set(items: &JsValue) -> js_sys::Promise;

	#[wasm_bindgen(js_name = setTimeout)]
	pub(crate) fn set_timeout(handler: &js_sys::Function, millis: i32) -> i32;

	#[wasm_bindgen(js_name = clearTimeout)]
	pub(crate) fn clear_timeout(handle: i32);
}
