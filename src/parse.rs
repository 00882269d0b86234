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

use {
	crate::{xml::{self, Element}, error::{Error, Result}},
	serde::{Serialize, Deserialize},
	std::{io, collections::BTreeMap}
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
	pub tag:  String,
	pub text: String,
	#[serde(default)]
	pub tail: String
}

/// A C declaration with markup, e.g. `const <type>char</type>* <name>pName</name>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
	#[serde(default)]
	pub text:  String,
	#[serde(default)]
	pub nodes: Vec<Node>
}

impl Decl {
	fn from_element(e: &Element) -> Self {
		Self {
			text:  e.text.clone(),
			nodes: e.children.iter()
				.map(|c| Node { tag: c.tag.clone(), text: c.itertext(), tail: c.tail.clone() })
				.collect()
		}
	}

	pub fn node(&self, tag: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.tag == tag)
	}

	/// The text of the `type` node, empty if there is none.
	pub fn type_name(&self) -> &str {
		self.node("type").map_or("", |n| n.text.as_str())
	}

	/// The text of the `name` node, empty if there is none.
	pub fn name(&self) -> &str {
		self.node("name").map_or("", |n| n.text.as_str())
	}

	pub fn itertext(&self) -> String {
		self.nodes.iter().fold(self.text.clone(), |mut buf, n| {
			buf.push_str(&n.text);
			buf.push_str(&n.tail);
			buf
		})
	}
}

/// A struct member or command parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
	#[serde(flatten)]
	pub decl:                  Decl,
	#[serde(default)]
	pub len:                   Option<String>,
	#[serde(default)]
	pub optional:              Option<String>,
	#[serde(default)]
	pub noautovalidity:        bool,
	#[serde(default)]
	pub externsync:            Option<String>,
	/// Written by the implementation, never read from the application.
	#[serde(default)]
	pub returnedonly:          bool,
	#[serde(default)]
	pub validextensionstructs: Vec<String>
}

impl Member {
	fn from_element(e: &Element) -> Self {
		Self {
			decl:                  Decl::from_element(e),
			len:                   e.attr("len").map(String::from),
			optional:              e.attr("optional").map(String::from),
			noautovalidity:        e.has_attr("noautovalidity"),
			externsync:            e.attr("externsync").map(String::from),
			returnedonly:          e.attr("returnedonly") == Some("true"),
			validextensionstructs: e.attr("validextensionstructs")
				.map(|s| s.split(',').map(String::from).collect())
				.unwrap_or_default()
		}
	}

	pub fn name(&self) -> &str {
		self.decl.name()
	}

	pub fn type_name(&self) -> &str {
		self.decl.type_name()
	}

	/// Number of `*` following the type.
	pub fn pointer_depth(&self) -> usize {
		self.decl.node("type").map_or(0, |n| n.tail.matches('*').count())
	}

	pub fn is_pointer(&self) -> bool {
		self.pointer_depth() > 0
	}

	/// Number of `[` following the name.
	pub fn static_array_dims(&self) -> usize {
		self.decl.node("name").map_or(0, |n| n.tail.matches('[').count())
	}

	pub fn is_static_array(&self) -> bool {
		self.static_array_dims() > 0
	}

	/// The length of a static array, either a literal (`[4]`) or a constant (`[<enum>X</enum>]`).
	pub fn static_array_len(&self) -> Option<String> {
		if !self.is_static_array() {
			return None;
		}

		match self.decl.node("enum") {
			Some(n) => Some(n.text.clone()),
			None => self.decl.node("name").map(|n| n.tail
				.trim()
				.trim_start_matches('[')
				.trim_end_matches(']')
				.to_string())
		}
	}

	pub fn is_const(&self) -> bool {
		self.decl.text.contains("const")
	}

	/// The comma separated parts of the `len` attribute.
	pub fn lengths(&self) -> Vec<&str> {
		self.len.as_deref().map_or_else(Vec::new, |s| s.split(',').collect())
	}

	pub fn cdecl_text(&self) -> String {
		self.decl.itertext()
	}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
	Include,
	Define,
	Basetype,
	Handle,
	Enum,
	Bitmask,
	Struct,
	Union,
	Funcpointer
}

impl TypeCategory {
	pub fn parse(s: &str) -> Option<Self> {
		Some(match s {
			"include"     => Self::Include,
			"define"      => Self::Define,
			"basetype"    => Self::Basetype,
			"handle"      => Self::Handle,
			"enum"        => Self::Enum,
			"bitmask"     => Self::Bitmask,
			"struct"      => Self::Struct,
			"union"       => Self::Union,
			"funcpointer" => Self::Funcpointer,
			_ => return None
		})
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Include     => "include",
			Self::Define      => "define",
			Self::Basetype    => "basetype",
			Self::Handle      => "handle",
			Self::Enum        => "enum",
			Self::Bitmask     => "bitmask",
			Self::Struct      => "struct",
			Self::Union       => "union",
			Self::Funcpointer => "funcpointer"
		}
	}

	pub fn is_aggregate(self) -> bool {
		matches!(self, Self::Struct | Self::Union)
	}
}

impl std::fmt::Display for TypeCategory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeInfo {
	pub name:           String,
	pub category:       Option<TypeCategory>,
	/// The declaration of non-aggregate types.
	pub decl:           Decl,
	pub members:        Vec<Member>,
	pub parent:         Option<String>,
	pub requires:       Option<String>,
	pub returnedonly:   bool,
	/// The value the `sType` member must have, if the registry states it.
	pub struct_type:    Option<String>,
	pub validity:       Option<Vec<String>>,
	pub added_usages:   Vec<String>,
	pub removed_usages: Vec<String>
}

impl TypeInfo {
	fn from_element(e: &Element) -> Self {
		let category = e.attr("category").and_then(TypeCategory::parse);
		let name = e.attr("name")
			.map(String::from)
			.or_else(|| e.child_text("name"))
			.unwrap_or_default();
		let aggregate = category.map_or(false, TypeCategory::is_aggregate);
		let members = e.children_named("member")
			.map(Member::from_element)
			.collect::<Vec<_>>();
		let struct_type = e.children_named("member")
			.find(|m| m.child_text("name").as_deref() == Some("sType"))
			.and_then(|m| m.attr("values"))
			.map(String::from);

		Self {
			name,
			category,
			decl:           if aggregate { Decl::default() } else { Decl::from_element(e) },
			members,
			parent:         e.attr("parent").map(String::from),
			requires:       e.attr("requires").map(String::from),
			returnedonly:   e.attr("returnedonly") == Some("true"),
			struct_type,
			validity:       parse_validity(e),
			added_usages:   Vec::new(),
			removed_usages: Vec::new()
		}
	}
}

/// A numeric enumerant encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumValue {
	Value(String),
	Bitpos(String),
	Offset {
		offset:    String,
		extnumber: String,
		#[serde(default)]
		dir:       Option<String>
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enumerant {
	pub name:      String,
	pub value:     Option<EnumValue>,
	pub extends:   Option<String>,
	/// The extension that added this enumerant to its group.
	pub extname:   Option<String>,
	/// The `supported` attribute of that extension.
	pub supported: Option<String>
}

impl Enumerant {
	fn from_element(e: &Element, ext: Option<(&str, u32, Option<&str>)>) -> Self {
		let value = if let Some(v) = e.attr("value") {
			Some(EnumValue::Value(v.to_string()))
		} else if let Some(v) = e.attr("bitpos") {
			Some(EnumValue::Bitpos(v.to_string()))
		} else {
			e.attr("offset").map(|offset| EnumValue::Offset {
				offset:    offset.to_string(),
				extnumber: e.attr("extnumber")
					.map(String::from)
					.or_else(|| ext.map(|(_, number, _)| number.to_string()))
					.unwrap_or_default(),
				dir:       e.attr("dir").map(String::from)
			})
		};

		Self {
			name:      e.attr("name").unwrap_or_default().to_string(),
			value,
			extends:   e.attr("extends").map(String::from),
			extname:   ext.map(|(name, ..)| name.to_string()),
			supported: ext.and_then(|(_, _, supported)| supported.map(String::from))
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
	pub name:    String,
	/// Whether the group holds bit positions (`type="bitmask"`).
	pub bitmask: bool,
	pub enums:   Vec<Enumerant>
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandInfo {
	pub name:                String,
	pub proto:               Decl,
	pub params:              Vec<Member>,
	pub queues:              Option<String>,
	pub renderpass:          Option<String>,
	pub cmdbufferlevel:      Option<String>,
	pub successcodes:        Option<String>,
	pub errorcodes:          Option<String>,
	pub implicit_externsync: Vec<String>,
	pub validity:            Option<Vec<String>>,
	pub added_usages:        Vec<String>,
	pub removed_usages:      Vec<String>
}

impl CommandInfo {
	fn from_element(e: &Element) -> Result<Self> {
		let proto = e.child("proto")
			.map(Decl::from_element)
			.ok_or_else(|| Error::registry("command without <proto>"))?;

		Ok(Self {
			name:                proto.name().to_string(),
			params:              e.children_named("param").map(Member::from_element).collect(),
			queues:              e.attr("queues").map(String::from),
			renderpass:          e.attr("renderpass").map(String::from),
			cmdbufferlevel:      e.attr("cmdbufferlevel").map(String::from),
			successcodes:        e.attr("successcodes").map(String::from),
			errorcodes:          e.attr("errorcodes").map(String::from),
			implicit_externsync: e.child("implicitexternsyncparams")
				.map(|e| e.children_named("param").map(Element::itertext).collect())
				.unwrap_or_default(),
			validity:            parse_validity(e),
			added_usages:        Vec::new(),
			removed_usages:      Vec::new(),
			proto
		})
	}

	/// The return type of the command.
	pub fn result_type(&self) -> &str {
		self.proto.type_name()
	}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
	Feature,
	Extension
}

impl Default for FeatureKind {
	fn default() -> Self {
		Self::Feature
	}
}

/// The names required or removed by a `<require>`/`<remove>` block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interface {
	pub profile:  Option<String>,
	pub types:    Vec<String>,
	pub enums:    Vec<String>,
	pub commands: Vec<String>
}

impl Interface {
	fn from_element(e: &Element) -> Self {
		let names = |tag: &str| -> Vec<String> { e.children_named(tag)
			.filter_map(|e| e.attr("name"))
			.map(String::from)
			.collect() };

		Self {
			profile:  e.attr("profile").map(String::from),
			types:    names("type"),
			enums:    names("enum"),
			commands: names("command")
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
	pub name:      String,
	pub kind:      FeatureKind,
	pub api:       Option<String>,
	/// The API version, `0` for extensions.
	pub version:   String,
	/// The extension number, `0` for core versions.
	pub number:    u32,
	/// `VERSION` for core versions, the vendor tag for extensions.
	pub category:  String,
	pub requires:  Vec<String>,
	pub protect:   Option<String>,
	pub supported: Option<String>,
	pub require:   Vec<Interface>,
	pub remove:    Vec<Interface>
}

impl Feature {
	pub fn version_number(&self) -> f64 {
		self.version.parse().unwrap_or(0.0)
	}

	fn from_element(e: &Element) -> Result<Self> {
		let name = e.attr("name")
			.ok_or_else(|| Error::registry(format!("<{}> without a name", e.tag)))?
			.to_string();
		let (kind, version, number, category) = match e.tag.as_str() {
			"feature" => (
				FeatureKind::Feature,
				e.attr("number").unwrap_or("0").to_string(),
				0,
				"VERSION".to_string()
			),
			_ => (
				FeatureKind::Extension,
				"0".to_string(),
				e.attr("number")
					.unwrap_or("0")
					.parse()
					.map_err(|_| Error::registry(format!("invalid extension number of `{}`", name)))?,
				name.splitn(3, '_').nth(1).unwrap_or_default().to_string()
			)
		};

		Ok(Self {
			kind,
			version,
			number,
			category,
			api:       e.attr("api").map(String::from),
			requires:  e.attr("requires")
				.map(|s| s.split(',').map(String::from).collect())
				.unwrap_or_default(),
			protect:   e.attr("protect").map(String::from),
			supported: e.attr("supported").map(String::from),
			require:   e.children_named("require").map(Interface::from_element).collect(),
			remove:    e.children_named("remove").map(Interface::from_element).collect(),
			name
		})
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
	pub types:    BTreeMap<String, TypeInfo>,
	pub groups:   BTreeMap<String, Group>,
	/// Enumerants that are not part of a typed group, e.g. API constants.
	pub enums:    BTreeMap<String, Enumerant>,
	pub commands: BTreeMap<String, CommandInfo>,
	/// Core versions and extensions in document order.
	pub features: Vec<Feature>
}

impl Registry {
	pub fn from_xml(reader: impl io::Read) -> Result<Self> {
		Self::from_element(&xml::parse(reader)?)
	}

	pub fn from_json(reader: impl io::Read) -> Result<Self> {
		Ok(serde_json::from_reader(reader)?)
	}

	pub fn from_element(root: &Element) -> Result<Self> {
		let mut registry = Self::default();

		for e in &root.children {
			match e.tag.as_str() {
				"types" => for ty in e.children_named("type") {
					let ty = TypeInfo::from_element(ty);
					registry.types.insert(ty.name.clone(), ty);
				},
				"enums" => {
					let name = e.attr("name").unwrap_or_default().to_string();
					let enums = e.children_named("enum")
						.map(|e| Enumerant::from_element(e, None))
						.collect::<Vec<_>>();

					match e.attr("type") {
						Some(ty) => {
							registry.groups.insert(name.clone(), Group { name, bitmask: ty == "bitmask", enums });
						}
						None => registry.enums.extend(enums.into_iter().map(|e| (e.name.clone(), e)))
					}
				}
				"commands" => for cmd in e.children_named("command") {
					let cmd = CommandInfo::from_element(cmd)?;
					registry.commands.insert(cmd.name.clone(), cmd);
				},
				"feature" => {
					registry.add_interface_enums(e, None);
					registry.features.push(Feature::from_element(e)?);
				}
				"extensions" => for ext in e.children_named("extension") {
					let feature = Feature::from_element(ext)?;
					registry.add_interface_enums(ext, Some((&feature.name, feature.number, feature.supported.as_deref())));
					registry.features.push(feature);
				},
				_ => ()
			}
		}

		Ok(registry)
	}

	/// Merges the enumerants and usages defined by a feature into the registry.
	fn add_interface_enums(&mut self, feature: &Element, ext: Option<(&str, u32, Option<&str>)>) {
		for (req, removed) in feature.children.iter()
			.filter_map(|e| match e.tag.as_str() {
				"require" => Some((e, false)),
				"remove"  => Some((e, true)),
				_ => None
			}) {
			for e in &req.children {
				match e.tag.as_str() {
					"enum" if !removed && e.attr("extends").is_some() => {
						let enumerant = Enumerant::from_element(e, ext);
						if let Some(group) = enumerant.extends.as_ref().and_then(|g| self.groups.get_mut(g)) {
							if !group.enums.iter().any(|v| v.name == enumerant.name) {
								group.enums.push(enumerant);
							}
						}
					}
					"enum" if !removed && (e.has_attr("value") || e.has_attr("bitpos") || e.has_attr("offset")) => {
						let enumerant = Enumerant::from_element(e, None);
						self.enums.insert(enumerant.name.clone(), enumerant);
					}
					"usage" => {
						let text = e.itertext();
						if let Some(cmd) = e.attr("command").and_then(|name| self.commands.get_mut(name)) {
							(if removed { &mut cmd.removed_usages } else { &mut cmd.added_usages }).push(text);
						} else if let Some(ty) = e.attr("struct").and_then(|name| self.types.get_mut(name)) {
							(if removed { &mut ty.removed_usages } else { &mut ty.added_usages }).push(text);
						}
					}
					_ => ()
				}
			}
		}
	}

	pub fn get_type(&self, name: &str) -> Option<&TypeInfo> {
		self.types.get(name)
	}

	pub fn get_group(&self, name: &str) -> Option<&Group> {
		self.groups.get(name)
	}

	pub fn get_command(&self, name: &str) -> Option<&CommandInfo> {
		self.commands.get(name)
	}

	pub fn type_category(&self, name: &str) -> Option<TypeCategory> {
		self.types.get(name).and_then(|ty| ty.category)
	}

	pub fn handle_parent(&self, name: &str) -> Option<&str> {
		self.types.get(name).and_then(|ty| ty.parent.as_deref())
	}

	/// Whether `name` is a handle declared with `VK_DEFINE_HANDLE`.
	pub fn is_dispatchable(&self, name: &str) -> bool {
		self.types.get(name)
			.filter(|ty| ty.category == Some(TypeCategory::Handle))
			.map_or(false, |ty| ty.decl.type_name() == "VK_DEFINE_HANDLE")
	}

	pub fn has_group(&self, name: &str) -> bool {
		self.groups.contains_key(name)
	}
}

fn parse_validity(e: &Element) -> Option<Vec<String>> {
	e.child("validity")
		.map(|v| v.children_named("usage").map(Element::itertext).collect())
}
