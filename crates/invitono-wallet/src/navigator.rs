//! Page-location seam for the redirect protocol.
//!
//! The session machine never touches a real browser address bar directly; it
//! reads and rewrites the location through this trait so the redirect
//! protocol can be driven headlessly.

/// The client page's current address, broken into the parts the protocol
/// cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
	/// Scheme plus authority, e.g. `https://invite.example.com`.
	pub origin: String,
	/// Path component, e.g. `/`.
	pub path: String,
	/// Query parameters in page order.
	pub query: Vec<(String, String)>,
}

impl PageLocation {
	/// Creates a location with no query string.
	pub fn new(origin: impl Into<String>, path: impl Into<String>) -> Self {
		Self {
			origin: origin.into(),
			path: path.into(),
			query: Vec::new(),
		}
	}

	/// Appends a query parameter.
	pub fn with_param(mut self, name: &str, value: &str) -> Self {
		self.query.push((name.to_string(), value.to_string()));
		self
	}

	/// Returns the first value of the named query parameter.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.query
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// Returns a copy of this location with the named parameters removed.
	pub fn without_params(&self, names: &[&str]) -> Self {
		Self {
			origin: self.origin.clone(),
			path: self.path.clone(),
			query: self
				.query
				.iter()
				.filter(|(key, _)| !names.contains(&key.as_str()))
				.cloned()
				.collect(),
		}
	}

	/// Renders the location as a full address.
	pub fn href(&self) -> String {
		if self.query.is_empty() {
			format!("{}{}", self.origin, self.path)
		} else {
			let query: Vec<String> = self
				.query
				.iter()
				.map(|(key, value)| format!("{}={}", key, value))
				.collect();
			format!("{}{}?{}", self.origin, self.path, query.join("&"))
		}
	}
}

/// Abstraction over the browser's location and navigation facilities.
pub trait Navigator: Send + Sync {
	/// The page's current address.
	fn location(&self) -> PageLocation;

	/// Performs a full-page navigation to `url`. Control does not return to
	/// the current page; resumption happens via the callback phase on the
	/// next load.
	fn navigate(&self, url: &str);

	/// Rewrites the current address without reloading, used to scrub
	/// callback parameters after they have been processed.
	fn replace_location(&self, location: &PageLocation);
}
