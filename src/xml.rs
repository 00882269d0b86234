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

//! A small element tree, just enough to walk the registry.
//!
//! Character data is stored the way the registry's declarations need it: `text` is everything
//! before the first child, `tail` is everything after the element's closing tag up to the next
//! sibling.

use {
	crate::error::{Error, Result},
	::xml::reader::{EventReader, ParserConfig, XmlEvent},
	std::io
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
	pub tag:      String,
	pub attrs:    Vec<(String, String)>,
	pub text:     String,
	pub children: Vec<Element>,
	pub tail:     String
}

impl Element {
	pub fn new(tag: &str) -> Self {
		Self { tag: tag.to_string(), ..Self::default() }
	}

	pub fn attr(&self, name: &str) -> Option<&str> {
		self.attrs.iter()
			.find(|(k, _)| k == name)
			.map(|(_, v)| v.as_str())
	}

	pub fn has_attr(&self, name: &str) -> bool {
		self.attr(name).is_some()
	}

	pub fn child(&self, tag: &str) -> Option<&Element> {
		self.children.iter().find(|e| e.tag == tag)
	}

	pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
		self.children.iter().filter(move |e| e.tag == tag)
	}

	/// The text of the first child with the given tag.
	pub fn child_text(&self, tag: &str) -> Option<String> {
		self.child(tag).map(Self::itertext)
	}

	/// All character data of this element and its descendants, excluding the own tail.
	pub fn itertext(&self) -> String {
		let mut buf = self.text.clone();
		for child in &self.children {
			buf.push_str(&child.itertext());
			buf.push_str(&child.tail);
		}
		buf
	}
}

pub fn parse(reader: impl io::Read) -> Result<Element> {
	let config = ParserConfig::new()
		.trim_whitespace(false)
		.whitespace_to_characters(true)
		.cdata_to_characters(true)
		.ignore_comments(true);

	let mut stack: Vec<Element> = Vec::new();
	let mut root = None;

	for event in EventReader::new_with_config(reader, config) {
		match event? {
			XmlEvent::StartElement { name, attributes, .. } => stack.push(Element {
				tag:   name.local_name,
				attrs: attributes.into_iter()
					.map(|a| (a.name.local_name, a.value))
					.collect(),
				..Element::default()
			}),
			XmlEvent::EndElement { .. } => {
				let e = stack.pop()
					.ok_or_else(|| Error::registry("unbalanced closing tag"))?;
				match stack.last_mut() {
					Some(parent) => parent.children.push(e),
					None => root = Some(e)
				}
			}
			XmlEvent::Characters(s) | XmlEvent::Whitespace(s) => if let Some(e) = stack.last_mut() {
				match e.children.last_mut() {
					Some(prev) => prev.tail.push_str(&s),
					None       => e.text.push_str(&s)
				}
			},
			_ => ()
		}
	}

	root.ok_or_else(|| Error::registry("document has no root element"))
}
