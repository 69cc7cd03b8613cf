//! [`Host`] over the `chrome.tabs` / `chrome.windows` extension APIs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use clut::{DeadlineTicket, Host, HostError, TabId, TabInfo, TabSnapshot, WindowId};
use js_sys::{Object, Reflect};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::{clear_timeout, set_timeout, stringify_js_error, tabs_get, tabs_update, windows_get_all, windows_update};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChromeWindow {
	#[serde(default)]
	focused: bool,
	#[serde(default)]
	tabs: Vec<ChromeTab>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChromeTab {
	/// Absent for tabs that are not browser tabs (e.g. devtools).
	id: Option<i32>,
	window_id: i32,
	#[serde(default)]
	active: bool,
}

struct Timer {
	handle: i32,
	_callback: Closure<dyn FnMut()>,
}

/// Browser services backed by the extension APIs.
///
/// Deadlines run on `setTimeout`; a fired deadline is handed to
/// [`crate::fire_deadline`] from a fresh task so its closure can be dropped.
#[derive(Default)]
pub struct ChromeHost {
	timers: RefCell<HashMap<DeadlineTicket, Timer>>,
}

impl ChromeHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Releases the callback of a deadline that has fired.
	pub fn forget_timer(&self, ticket: DeadlineTicket) {
		self.timers.borrow_mut().remove(&ticket);
	}
}

#[async_trait(?Send)]
impl Host for ChromeHost {
	async fn enumerate(&self) -> Result<Vec<TabSnapshot>, HostError> {
		let query = Object::new();
		Reflect::set(&query, &JsValue::from_str("populate"), &JsValue::TRUE).map_err(|e| HostError::Js(stringify_js_error(e)))?;

		let windows = JsFuture::from(windows_get_all(&query))
			.await
			.map_err(|e| HostError::Enumerate(stringify_js_error(e)))?;
		let windows: Vec<ChromeWindow> = serde_wasm_bindgen::from_value(windows).map_err(|e| HostError::Enumerate(e.to_string()))?;

		Ok(snapshots(&windows))
	}

	async fn tab(&self, id: TabId) -> Result<TabInfo, HostError> {
		// `tabs.get` only rejects when the id is unknown.
		let tab = JsFuture::from(tabs_get(id.0)).await.map_err(|_| HostError::TabNotFound(id))?;
		let tab: ChromeTab = serde_wasm_bindgen::from_value(tab).map_err(|e| HostError::Js(e.to_string()))?;
		Ok(TabInfo {
			id,
			window: WindowId(tab.window_id),
		})
	}

	async fn focus_window(&self, window: WindowId) -> Result<(), HostError> {
		let props = flags(&[("focused", true)]).map_err(|e| HostError::Js(stringify_js_error(e)))?;
		JsFuture::from(windows_update(window.0, &props))
			.await
			.map(|_| ())
			.map_err(|e| HostError::WindowFocus {
				window,
				message: stringify_js_error(e),
			})
	}

	async fn activate_tab(&self, id: TabId) -> Result<(), HostError> {
		let props = flags(&[("active", true), ("highlighted", true)]).map_err(|e| HostError::Js(stringify_js_error(e)))?;
		JsFuture::from(tabs_update(id.0, &props))
			.await
			.map(|_| ())
			.map_err(|e| HostError::TabActivation {
				tab: id,
				message: stringify_js_error(e),
			})
	}

	fn arm_deadline(&self, ticket: DeadlineTicket, after: Duration) {
		let callback = Closure::<dyn FnMut()>::new(move || {
			wasm_bindgen_futures::spawn_local(async move {
				crate::fire_deadline(ticket);
			});
		});
		let millis = i32::try_from(after.as_millis()).unwrap_or(i32::MAX);
		let handle = set_timeout(callback.as_ref().unchecked_ref(), millis);
		let previous = self.timers.borrow_mut().insert(
			ticket,
			Timer {
				handle,
				_callback: callback,
			},
		);
		if let Some(previous) = previous {
			clear_timeout(previous.handle);
		}
	}

	fn disarm_deadline(&self, ticket: DeadlineTicket) {
		if let Some(timer) = self.timers.borrow_mut().remove(&ticket) {
			clear_timeout(timer.handle);
		}
	}
}

fn snapshots(windows: &[ChromeWindow]) -> Vec<TabSnapshot> {
	windows
		.iter()
		.flat_map(|window| {
			window.tabs.iter().filter_map(move |tab| {
				Some(TabSnapshot {
					tab: TabId(tab.id?),
					window: WindowId(tab.window_id),
					active: tab.active,
					window_focused: window.focused,
				})
			})
		})
		.collect()
}

fn flags(pairs: &[(&str, bool)]) -> Result<JsValue, JsValue> {
	let obj = Object::new();
	for (key, value) in pairs {
		Reflect::set(&obj, &JsValue::from_str(key), &JsValue::from_bool(*value))?;
	}
	Ok(obj.into())
}
