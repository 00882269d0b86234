// MIT License
//
// Copyright (c) 2026 The vkregen developers
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	#[error("xml error: {0}")]
	Xml(#[from] ::xml::reader::Error),

	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid pattern: {0}")]
	Regex(#[from] regex::Error),

	/// The registry is missing data a generator depends on, or the data is malformed.
	#[error("registry error: {0}")]
	Registry(String),

	/// A construct hook was invoked while no feature was open.
	#[error("attempt to generate {kind} `{name}` when not in feature")]
	NotInFeature { kind: &'static str, name: String },

	/// The registry uses a pattern no validation code can be generated for.
	#[error("unsupported: {0}")]
	Unsupported(String)
}

impl Error {
	pub(crate) fn registry(msg: impl Into<String>) -> Self {
		Self::Registry(msg.into())
	}
}
