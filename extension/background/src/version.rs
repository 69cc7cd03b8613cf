//! Install/update bookkeeping against the stored extension version.

use js_sys::{Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::{runtime_get_manifest, storage_local_get, storage_local_set};

const VERSION_KEY: &str = "version";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionChange {
	Installed,
	Updated { previous: String },
	Unchanged,
}

pub fn classify(previous: Option<&str>, current: &str) -> VersionChange {
	match previous {
		None => VersionChange::Installed,
		Some(previous) if previous == current => VersionChange::Unchanged,
		Some(previous) => VersionChange::Updated {
			previous: previous.to_string(),
		},
	}
}

/// Compares the manifest version with the stored one and records the current version.
pub async fn check_version() -> Result<VersionChange, JsValue> {
	let manifest = runtime_get_manifest();
	let current = Reflect::get(&manifest, &JsValue::from_str("version"))?
		.as_string()
		.unwrap_or_default();

	let stored = JsFuture::from(storage_local_get(&JsValue::from_str(VERSION_KEY))).await?;
	let previous = Reflect::get(&stored, &JsValue::from_str(VERSION_KEY))?.as_string();

	let change = classify(previous.as_deref(), &current);
	if change != VersionChange::Unchanged {
		let items = Object::new();
		Reflect::set(&items, &JsValue::from_str(VERSION_KEY), &JsValue::from_str(&current))?;
		JsFuture::from(storage_local_set(&items)).await?;
	}
	Ok(change)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_version_is_a_fresh_install() {
		assert_eq!(classify(None, "2.0.0"), VersionChange::Installed);
	}

	#[test]
	fn different_version_is_an_update() {
		assert_eq!(
			classify(Some("1.9.0"), "2.0.0"),
			VersionChange::Updated {
				previous: "1.9.0".into()
			}
		);
	}

	#[test]
	fn same_version_is_unchanged() {
		assert_eq!(classify(Some("2.0.0"), "2.0.0"), VersionChange::Unchanged);
	}
}
