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

//! Parameter validation functions of a validation layer.
//!
//! Each feature is handled in two passes. The construct hooks only record what is known about
//! structs, handles, bitmasks and enum groups. When the feature ends, a check fragment is built
//! for every struct, and then one validation function for every command, with struct fragments
//! expanded wherever a struct is passed.

use {
	super::{*, decl::*},
	crate::options::{CommonOptions, ParamCheckerGeneratorOptions},
	std::{fmt, io::Write, collections::BTreeSet}
};

/// Commands implemented by the layer interface or validated by hand.
const BLACKLIST: [&str; 8] = [
	"vkGetInstanceProcAddr",
	"vkGetDeviceProcAddr",
	"vkEnumerateInstanceLayerProperties",
	"vkEnumerateInstanceExtensionProperties",
	"vkEnumerateDeviceLayerProperties",
	"vkEnumerateDeviceExtensionProperties",
	"vkCreateDebugReportCallbackEXT",
	"vkDebugReportMessageEXT"
];

/// Struct members only validated if a sibling member has a certain value.
const MEMBER_CONDITIONS: [(&str, &str, &str); 1] = [
	("VkPipelineColorBlendStateCreateInfo", "logicOp", "logicOpEnable == VK_TRUE")
];

/// The `pNext` chains of these are modified by the loader.
const UNCHECKED_CHAINS: [&str; 2] = ["VkDeviceCreateInfo", "VkInstanceCreateInfo"];

#[derive(Clone, Debug, PartialEq, Eq)]
enum Piece {
	Text(String),
	/// The name of the validated function, as printed in messages.
	Func,
	/// The expression the checked value is reached through, e.g. `pCreateInfo->`.
	Value,
	/// The prefix of the value's name in messages.
	Display
}

/// A piece of generated code, possibly with holes for the names of the value being checked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Template(Vec<Piece>);

impl Template {
	fn push(&mut self, piece: Piece) {
		match (self.0.last_mut(), piece) {
			(Some(Piece::Text(last)), Piece::Text(s)) => last.push_str(&s),
			(_, piece) => self.0.push(piece)
		}
	}

	fn push_str(&mut self, s: &str) {
		if !s.is_empty() {
			self.push(Piece::Text(s.to_string()));
		}
	}

	fn append(&mut self, other: &Self) {
		for piece in &other.0 {
			self.push(piece.clone());
		}
	}

	pub fn substitute(&self, names: &Names) -> Self {
		let mut t = Self::default();
		for piece in &self.0 {
			match piece {
				Piece::Text(s)  => t.push_str(s),
				Piece::Func     => t.append(&names.func),
				Piece::Value    => t.append(&names.value),
				Piece::Display  => t.append(&names.display)
			}
		}
		t
	}

	pub fn has_holes(&self) -> bool {
		self.0.iter().any(|p| !matches!(p, Piece::Text(_)))
	}
}

/// Holes render as nothing.
impl fmt::Display for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for piece in &self.0 {
			if let Piece::Text(s) = piece {
				f.write_str(s)?;
			}
		}
		Ok(())
	}
}

trait Part {
	fn push_to(&self, t: &mut Template);
}

impl Part for str {
	fn push_to(&self, t: &mut Template) {
		t.push_str(self);
	}
}

impl Part for String {
	fn push_to(&self, t: &mut Template) {
		t.push_str(self);
	}
}

impl Part for Template {
	fn push_to(&self, t: &mut Template) {
		t.append(self);
	}
}

impl<T: Part + ?Sized> Part for &T {
	fn push_to(&self, t: &mut Template) {
		(**self).push_to(t);
	}
}

macro_rules! template {
	($($part:expr),* $(,)?) => {{
		let mut t = Template::default();
		$(Part::push_to(&$part, &mut t);)*
		t
	}};
}

/// What the holes of a [`Template`] are filled with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Names {
	pub func:    Template,
	pub value:   Template,
	pub display: Template
}

impl Names {
	/// Names left open, for the fragment of a struct.
	pub fn holes() -> Self {
		Self {
			func:    Template(vec![Piece::Func]),
			value:   Template(vec![Piece::Value]),
			display: Template(vec![Piece::Display])
		}
	}

	/// The names of a command's parameters.
	pub fn command(name: &str) -> Self {
		Self { func: template![name], ..Self::default() }
	}

	fn member(&self, value: Template, display: Template) -> Self {
		Self { func: self.func.clone(), value, display }
	}
}

/// A statement of a validation function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
	Line(Template),
	/// `head` followed by an indented body in braces, or a bare scope if `head` is empty.
	Block { head: Template, body: Vec<Stmt> },
	/// The checks of an expanded struct, separated by empty lines.
	Group(Vec<Stmt>)
}

impl Stmt {
	pub fn substitute(&self, names: &Names) -> Self {
		match self {
			Self::Line(t) => Self::Line(t.substitute(names)),
			Self::Block { head, body } => Self::Block {
				head: head.substitute(names),
				body: body.iter().map(|s| s.substitute(names)).collect()
			},
			Self::Group(stmts) => Self::Group(stmts.iter().map(|s| s.substitute(names)).collect())
		}
	}

	pub fn render(&self, out: &mut String, depth: usize) {
		let indent = "    ".repeat(depth);
		match self {
			Self::Line(t) => out.push_str(&format!("{}{}\n", indent, t)),
			Self::Block { head, body } => {
				if !head.0.is_empty() {
					out.push_str(&format!("{}{}\n", indent, head));
				}
				out.push_str(&format!("{}{{\n", indent));
				for stmt in body {
					stmt.render(out, depth + 1);
				}
				out.push_str(&format!("{}}}\n", indent));
			}
			Self::Group(stmts) => for (i, stmt) in stmts.iter().enumerate() {
				if i > 0 {
					out.push('\n');
				}
				stmt.render(out, depth);
			}
		}
	}
}

/// `skipCall |= function(report_data, args...);`
fn check(function: &str, args: &[&dyn Part]) -> Stmt {
	let mut t = template!["skipCall |= ", function, "(report_data"];
	for arg in args {
		t.push_str(", ");
		arg.push_to(&mut t);
	}
	t.push_str(");");
	Stmt::Line(t)
}

fn flag(b: bool) -> &'static str {
	if b { "true" } else { "false" }
}

fn quoted(s: &str) -> String {
	format!("\"{}\"", s)
}

fn unsupported(msg: String) -> Error {
	log::error!("unsupported parameter validation case: {}", msg);
	Error::Unsupported(msg)
}

/// The `optional` attribute, a single flag or one flag per level of indirection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Optional {
	#[default]
	No,
	Yes,
	Parts(Vec<bool>)
}

impl Optional {
	fn parse(s: Option<&str>) -> Self {
		match s {
			Some("true") => Self::Yes,
			Some(s) if s.contains(',') => Self::Parts(s.split(',')
				.filter_map(|part| match part.trim() {
					"true" => Some(true),
					"false" => Some(false),
					v => {
						log::warn!("unrecognized optional attribute value `{}`", v);
						None
					}
				})
				.collect()),
			_ => Self::No
		}
	}

	fn is_set(&self) -> bool {
		match self {
			Self::No => false,
			Self::Yes => true,
			Self::Parts(parts) => !parts.is_empty()
		}
	}
}

/// What is known about a parameter or struct member.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ParamData {
	ty:             String,
	name:           String,
	pointer:        bool,
	static_array:   bool,
	is_const:       bool,
	optional:       Optional,
	/// The parameter is the length of another one.
	is_count:       bool,
	noautovalidity: bool,
	len:            Option<String>,
	extstructs:     Vec<String>,
	condition:      Option<&'static str>
}

impl ParamData {
	fn new(m: &Member, lens: &BTreeSet<String>) -> Self {
		Self {
			ty:             m.type_name().to_string(),
			name:           m.name().to_string(),
			pointer:        m.is_pointer() || m.type_name().starts_with("PFN_"),
			static_array:   m.is_static_array(),
			is_const:       m.is_const(),
			optional:       Optional::parse(m.optional.as_deref()),
			is_count:       lens.contains(m.name()),
			noautovalidity: m.noautovalidity,
			len:            array_len(m),
			extstructs:     Vec::new(),
			condition:      None
		}
	}

	/// A length reached through a pointer, e.g. `pAllocateInfo->descriptorSetCount`.
	fn dereferenced(name: &str) -> Self {
		Self { name: name.to_string(), is_count: true, ..Self::default() }
	}
}

/// The `len` attribute without `null-terminated`.
fn array_len(m: &Member) -> Option<String> {
	match m.len.as_deref() {
		None | Some("null-terminated") => None,
		Some(len) if len.contains("null-terminated") => len.split(',').next().map(String::from),
		Some(len) => Some(len.to_string())
	}
}

/// Whether a handle parameter may be `VK_NULL_HANDLE`.
fn is_handle_optional(param: &ParamData, len: Option<&ParamData>) -> bool {
	param.optional.is_set() || param.noautovalidity || len.map_or(false, |l| l.optional.is_set())
}

/// The `VkStructureType` enumerant of a struct not declaring it, `VkFooBar` becomes
/// `VK_STRUCTURE_TYPE_FOO_BAR`.
fn gen_structure_type(name: &str) -> String {
	static WORDS: OnceLock<Regex> = OnceLock::new();
	let words = WORDS.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid pattern"));
	words.replace_all(name, "${1}_${2}")
		.to_uppercase()
		.replace("VK_", "VK_STRUCTURE_TYPE_")
}

/// The parameter a `latexmath` length is computed from.
fn parse_latex_math(source: &str) -> Result<&str> {
	static CEIL: OnceLock<Regex> = OnceLock::new();
	static DIV: OnceLock<Regex> = OnceLock::new();

	let invalid = || unsupported(format!("unrecognized latexmath expression `{}`", source));

	if source.contains("mathit") {
		let re = CEIL.get_or_init(|| Regex::new(
			r"^latexmath\s*:\s*\[\s*\$\\l(\w+)\s*\{\s*\\mathit\s*\{\s*(\w+)\s*\}\s*\\over\s*(\d+)\s*\}\s*\\r(\w+)\$\s*\]")
			.expect("valid pattern"));
		let caps = re.captures(source).ok_or_else(invalid)?;
		match (caps.get(1), caps.get(2), caps.get(4)) {
			(Some(l), Some(name), Some(r)) if l.as_str() == r.as_str() => Ok(name.as_str()),
			_ => Err(invalid())
		}
	} else {
		let re = DIV.get_or_init(|| Regex::new(r"^latexmath\s*:\s*\[\s*\$\s*(\w+)\s*\\over\s*(\d+)\s*\$\s*\]")
			.expect("valid pattern"));
		re.captures(source)
			.and_then(|caps| caps.get(1))
			.map(|m| m.as_str())
			.ok_or_else(invalid)
	}
}

#[derive(Clone, Debug)]
struct CommandData {
	name:   String,
	params: Vec<ParamData>,
	proto:  String
}

/// The array length of a checked value.
struct Length {
	param:   ParamData,
	/// The length as an expression.
	value:   Template,
	/// The quoted name of the length in messages.
	display: Template
}

/// A value being checked and the names it is written with.
struct Checked<'a> {
	param:   &'a ParamData,
	func:    Template,
	value:   Template,
	display: Template,
	len:     Option<Length>,
	/// Whether the value must not be `NULL`.
	req:     bool,
	/// Whether a length pointer must not be `NULL`.
	cp_req:  bool,
	/// Whether the length must not be 0.
	cv_req:  bool
}

impl Checked<'_> {
	fn len(&self, what: &str) -> Result<&Length> {
		self.len.as_ref().ok_or_else(|| unsupported(format!("{} `{}` without length", what, self.param.name)))
	}
}

pub struct ParamCheckerOutputGenerator<'a> {
	base:              GenBase<'a>,
	opts:              ParamCheckerGeneratorOptions,
	add_extensions:    Regex,
	/// Struct name to the `VkStructureType` value it requires.
	struct_types:      BTreeMap<String, String>,
	handle_types:      BTreeSet<String>,
	bitmask_types:     BTreeSet<String>,
	/// Bit group name to the names of its bits. Bits of extensions not selected by
	/// `add_extensions` or `default_extensions` are left out, the same way the C header leaves
	/// them out, so `All*Bits` only names declared enumerants.
	flag_bits:         BTreeMap<String, Vec<String>>,
	/// Enum group name to its range constants.
	enum_ranges:       BTreeMap<String, (String, String)>,
	/// Struct name to its check fragment, empty if nothing is checked.
	validated_structs: BTreeMap<String, Vec<Stmt>>,
	/// Members of the structs of the current feature without a fragment yet.
	pending_structs:   BTreeMap<String, Vec<ParamData>>,
	commands:          Vec<CommandData>,
	/// Bitmask types of the current feature.
	flags:             BTreeSet<String>
}

impl<'a> ParamCheckerOutputGenerator<'a> {
	pub fn new(registry: &'a Registry, opts: ParamCheckerGeneratorOptions) -> Result<Self> {
		Self::with_base(GenBase::new(registry), opts)
	}

	pub fn with_writer(registry: &'a Registry, opts: ParamCheckerGeneratorOptions, writer: &'a mut dyn io::Write) -> Result<Self> {
		Self::with_base(GenBase::with_writer(registry, writer), opts)
	}

	fn with_base(base: GenBase<'a>, opts: ParamCheckerGeneratorOptions) -> Result<Self> {
		Ok(Self {
			add_extensions:    CommonOptions::pattern(opts.common.add_extensions.as_deref())?,
			base,
			opts,
			struct_types:      BTreeMap::new(),
			handle_types:      BTreeSet::new(),
			bitmask_types:     BTreeSet::new(),
			flag_bits:         BTreeMap::new(),
			enum_ranges:       BTreeMap::new(),
			validated_structs: BTreeMap::new(),
			pending_structs:   BTreeMap::new(),
			commands:          Vec::new(),
			flags:             BTreeSet::new()
		})
	}

	fn protected_file(&self) -> Option<String> {
		match self.opts.decl.protect_file {
			true => self.opts.common.basename().map(|f| f.replace(".h", "_H").to_uppercase()),
			false => None
		}
	}

	fn struct_type(&self, name: &str) -> String {
		match self.struct_types.get(name) {
			Some(value) => value.clone(),
			None => {
				let value = gen_structure_type(name);
				log::debug!("generating {} for structure type `{}` not defined by the current feature", value, name);
				value
			}
		}
	}

	/// The check fragment of a struct, built on first use.
	fn struct_fragment(&mut self, name: &str) -> Result<Option<Vec<Stmt>>> {
		if let Some(members) = self.pending_structs.remove(name) {
			let (stmts, _) = self.gen_func_body(&Names::holes(), &members, Some(name))?;
			self.validated_structs.insert(name.to_string(), stmts);
		}
		Ok(self.validated_structs.get(name)
			.filter(|stmts| !stmts.is_empty())
			.cloned())
	}

	fn len_param(&self, values: &[ParamData], len: &str) -> Result<ParamData> {
		let name = if len.contains("->") {
			return Ok(ParamData::dereferenced(len));
		} else if len.contains("latexmath") {
			parse_latex_math(len)?
		} else {
			len
		};

		values.iter()
			.find(|p| p.name == name)
			.cloned()
			.ok_or_else(|| Error::registry(format!("unknown length parameter `{}`", name)))
	}

	/// The checks of a pointer or array value.
	fn pointer_checks(&self, c: &Checked, names: &Names, struct_name: Option<&str>) -> Result<Vec<Stmt>> {
		let param = c.param;
		let (func, value, display) = (&c.func, &c.value, &c.display);

		if let Some(stype) = self.struct_types.get(&param.ty) {
			let quoted_stype = quoted(stype);
			return Ok(vec![match &c.len {
				Some(len) if len.param.pointer => check("validate_struct_type_array", &[
					func, &len.display, display, &quoted_stype, &len.value, value, stype,
					&flag(c.cp_req), &flag(c.cv_req), &flag(c.req)]),
				Some(len) => check("validate_struct_type_array", &[
					func, &len.display, display, &quoted_stype, &len.value, value, stype,
					&flag(c.cv_req), &flag(c.req)]),
				None => check("validate_struct_type", &[func, display, &quoted_stype, value, stype, &flag(c.req)])
			}]);
		}

		if self.handle_types.contains(&param.ty) && param.is_const
			&& !is_handle_optional(param, c.len.as_ref().map(|l| &l.param)) {
			return match &c.len {
				Some(len) if !len.param.pointer => Ok(vec![check("validate_handle_array", &[
					func, &len.display, display, &len.value, value, &flag(c.cv_req), &flag(c.req)])]),
				Some(_) => Err(unsupported(format!("elements of output handle array `{}` are not NULL checked", param.name))),
				None => Err(unsupported(format!("output handle `{}` is not NULL checked", param.name)))
			};
		}

		if self.bitmask_types.contains(&param.ty) && param.is_const {
			let bits = param.ty.replace("Flags", "FlagBits");
			if !self.flag_bits.contains_key(&bits) {
				return Err(unsupported(format!("array `{}` of reserved flags `{}`", param.name, param.ty)));
			}
			let len = c.len("flags array")?;
			return Ok(vec![check("validate_flags_array", &[
				func, &len.display, display, &quoted(&bits), &format!("All{}", bits), &len.value, value,
				&flag(c.cv_req), &flag(c.req)])]);
		}

		if param.ty == "VkBool32" && param.is_const {
			let len = c.len("boolean array")?;
			return Ok(vec![check("validate_bool32_array", &[
				func, &len.display, display, &len.value, value, &flag(c.cv_req), &flag(c.req)])]);
		}

		if let Some((begin, end)) = self.enum_ranges.get(&param.ty).filter(|_| param.is_const) {
			let len = c.len("enum array")?;
			return Ok(vec![check("validate_ranged_enum_array", &[
				func, &len.display, display, &quoted(&param.ty), begin, end, &len.value, value,
				&flag(c.cv_req), &flag(c.req)])]);
		}

		if param.name == "pNext" {
			if struct_name.map_or(false, |s| UNCHECKED_CHAINS.contains(&s)) {
				return Ok(Vec::new());
			}
			return Ok(vec![self.next_check(c)]);
		}

		Ok(match &c.len {
			Some(len) => {
				let required = match len.param.pointer {
					true => c.req || c.cp_req || c.cv_req,
					false => c.req || c.cv_req
				};
				if !required {
					return Ok(Vec::new());
				}

				let stmt = match len.param.pointer {
					true => check("validate_array", &[
						func, &len.display, display, &len.value, value,
						&flag(c.cp_req), &flag(c.cv_req), &flag(c.req)]),
					false => check(if param.ty == "char" { "validate_string_array" } else { "validate_array" }, &[
						func, &len.display, display, &len.value, value, &flag(c.cv_req), &flag(c.req)])
				};
				checked_length(names, &len.param.name, vec![stmt])
			}
			None if !param.optional.is_set() => match param.ty.starts_with("PFN_") {
				true => vec![check("validate_required_pointer", &[
					func, display, &template!["reinterpret_cast<const void*>(", value, ")"]])],
				false => vec![check("validate_required_pointer", &[func, display, value])]
			},
			None => Vec::new()
		})
	}

	/// The check of a `pNext` chain.
	fn next_check(&self, c: &Checked) -> Stmt {
		let param = c.param;
		if param.extstructs.is_empty() {
			return check("validate_struct_pnext", &[&c.func, &c.display, &"NULL", &c.value, &"0", &"NULL"]);
		}

		let types = param.extstructs.iter()
			.map(|s| self.struct_type(s))
			.collect::<Vec<_>>()
			.join(", ");
		Stmt::Block {
			head: Template::default(),
			body: vec![
				Stmt::Line(template!["const VkStructureType allowedStructs[] = {", types, "};"]),
				check("validate_struct_pnext", &[
					&c.func, &c.display, &quoted(&param.extstructs.join(", ")), &c.value,
					&"ARRAY_SIZE(allowedStructs)", &"allowedStructs"])
			]
		}
	}

	/// The checks of a value passed directly.
	fn scalar_checks(&self, c: &Checked) -> Vec<Stmt> {
		let param = c.param;
		let (func, value, display) = (&c.func, &c.value, &c.display);

		if let Some(stype) = self.struct_types.get(&param.ty) {
			vec![check("validate_struct_type", &[
				func, display, &quoted(stype), &template!["&(", value, ")"], stype, &"false"])]
		} else if self.handle_types.contains(&param.ty) {
			match is_handle_optional(param, None) {
				true => Vec::new(),
				false => vec![check("validate_required_handle", &[func, display, value])]
			}
		} else if self.bitmask_types.contains(&param.ty) {
			let bits = param.ty.replace("Flags", "FlagBits");
			match self.flag_bits.contains_key(&bits) {
				true => vec![check("validate_flags", &[
					func, display, &quoted(&bits), &format!("All{}", bits), value, &flag(!param.optional.is_set())])],
				false => vec![check("validate_reserved_flags", &[func, display, value])]
			}
		} else if param.ty == "VkBool32" {
			vec![check("validate_bool32", &[func, display, value])]
		} else if let Some((begin, end)) = self.enum_ranges.get(&param.ty) {
			vec![check("validate_ranged_enum", &[func, display, &quoted(&param.ty), begin, end, value])]
		} else {
			Vec::new()
		}
	}

	/// The statements checking `values`, and the names of the values nothing is checked for.
	fn gen_func_body(&mut self, names: &Names, values: &[ParamData], struct_name: Option<&str>) -> Result<(Vec<Stmt>, Vec<String>)> {
		let mut stmts = Vec::new();
		let mut unused = Vec::new();

		for param in values {
			let mut used = Vec::new();
			let mut c = Checked {
				param,
				func:    template!["\"", names.func, "\""],
				value:   template![names.value, param.name],
				display: template!["\"", names.display, param.name, "\""],
				len:     None,
				req:     !param.optional.is_set(),
				cp_req:  true,
				cv_req:  true
			};
			let owner = struct_name.map_or_else(|| names.func.to_string(), String::from);

			if (param.pointer || param.static_array) && !param.is_count {
				if let Some(len) = &param.len {
					let len = self.len_param(values, len)?;
					match (len.pointer, &len.optional) {
						(true, Optional::Parts(parts)) => {
							if parts.first() != parts.get(1) {
								log::debug!("length `{}` of {} {} is only partially optional", len.name, owner, param.name);
							}
							c.cp_req = !parts.first().copied().unwrap_or(false);
							c.cv_req = !parts.get(1).copied().unwrap_or(false);
						}
						(true, optional) => c.cp_req = !optional.is_set(),
						(false, optional) => c.cv_req = !optional.is_set()
					}
					c.len = Some(Length {
						value:   template![names.value, len.name],
						display: template!["\"", names.display, len.name, "\""],
						param:   len
					});
				}

				if param.noautovalidity {
					log::debug!("no parameter validation for {} {}", owner, param.name);
				} else {
					used.extend(self.pointer_checks(&c, names, struct_name)?);
				}

				if param.is_const {
					if let Some(fragment) = self.struct_fragment(&param.ty)? {
						used.push(struct_pointer_code(names, param, c.len.as_ref().map(|l| &l.param), &fragment));
					}
				}
			} else {
				if param.noautovalidity {
					log::debug!("no parameter validation for {} {}", owner, param.name);
				} else {
					used.extend(self.scalar_checks(&c));
				}

				if let Some(fragment) = self.struct_fragment(&param.ty)? {
					let member = names.member(
						template![names.value, param.name, "."],
						template![names.display, param.name, "."]);
					used.push(Stmt::Group(fragment.iter().map(|s| s.substitute(&member)).collect()));
				}
			}

			if used.is_empty() {
				if !param.is_count {
					unused.push(param.name.clone());
				}
				continue;
			}

			match param.condition {
				Some(condition) => stmts.push(Stmt::Block {
					head: template!["if (", names.value, condition, ")"],
					body: used
				}),
				None => stmts.extend(used)
			}
		}

		Ok((stmts, unused))
	}

	/// Builds the fragments of all structs of the current feature.
	fn process_struct_member_data(&mut self) -> Result<()> {
		let names = self.pending_structs.keys().cloned().collect::<Vec<_>>();
		for name in names {
			self.struct_fragment(&name)?;
		}
		Ok(())
	}

	/// The definition of the validation function of a command.
	fn cmd_def(&self, cmd: &CommandData, unused: &[String], body: &[Stmt]) -> String {
		let proto = cmd.proto.strip_suffix(';').unwrap_or(&cmd.proto);
		let mut lines = proto.lines().map(String::from).collect::<Vec<_>>();
		let report_data = format!("{:<width$}report_data,", "    debug_report_data*",
			width = self.opts.decl.align_func_param.max(23));

		if let Some(first) = lines.first_mut() {
			*first = format!("static bool parameter_validation_{}(", cmd.name);
		}
		match (cmd.name.as_str(), lines.len()) {
			("vkCreateInstance", _) | (_, 0 | 1) => lines.insert(1.min(lines.len()), report_data),
			_ => lines[1] = report_data
		}

		let mut def = lines.join("\n");
		def.push_str("\n{\n");
		for name in unused {
			def.push_str(&format!("    UNUSED_PARAMETER({});\n", name));
		}
		if !unused.is_empty() {
			def.push('\n');
		}
		def.push_str("    bool skipCall = false;\n");
		for stmt in body {
			def.push('\n');
			stmt.render(&mut def, 1);
		}
		def.push_str("\n    return skipCall;\n}\n");
		def
	}

	/// The validation functions of the commands of the current feature.
	fn process_cmd_data(&mut self) -> Result<Vec<String>> {
		let commands = std::mem::take(&mut self.commands);
		let mut defs = Vec::new();

		for cmd in &commands {
			// the first parameter is the dispatchable handle
			let start = if cmd.name == "vkCreateInstance" { 0 } else { 1 };
			let values = cmd.params.get(start..).unwrap_or_default();
			let (body, unused) = self.gen_func_body(&Names::command(&cmd.name), values, None)?;
			if !body.is_empty() {
				defs.push(self.cmd_def(cmd, &unused, &body));
			}
		}
		Ok(defs)
	}
}

/// Wraps `stmts` in `NULL` checks of every pointer a dereferenced length is read through.
fn checked_length(names: &Names, len: &str, stmts: Vec<Stmt>) -> Vec<Stmt> {
	let parts = len.split("->").collect::<Vec<_>>();
	(1..parts.len()).rev().fold(stmts, |body, i| vec![Stmt::Block {
		head: template!["if (", names.value, parts[..i].join("->"), " != NULL)"],
		body
	}])
}

/// The fragment of a struct expanded for a pointer to it, or an array of it.
fn struct_pointer_code(names: &Names, param: &ParamData, len: Option<&ParamData>, fragment: &[Stmt]) -> Stmt {
	let body = match len {
		Some(len) => {
			let count = len.name.rsplit("->").next().unwrap_or(&len.name);
			let index = count.replace("Count", "Index");
			let member = names.member(
				template![names.value, param.name, "[", index, "]."],
				template![names.display, param.name, "[i]."]);
			vec![Stmt::Block {
				head: template!["for (uint32_t ", index, " = 0; ", index, " < ", names.value, len.name, "; ++", index, ")"],
				body: vec![Stmt::Group(fragment.iter().map(|s| s.substitute(&member)).collect())]
			}]
		}
		None => {
			let member = names.member(
				template![names.value, param.name, "->"],
				template![names.display, param.name, "->"]);
			vec![Stmt::Group(fragment.iter().map(|s| s.substitute(&member)).collect())]
		}
	};

	Stmt::Block { head: template!["if (", names.value, param.name, " != NULL)"], body }
}

impl OutputGenerator for ParamCheckerOutputGenerator<'_> {
	fn active_feature(&self) -> Option<&ActiveFeature> {
		self.base.feature.as_ref()
	}

	fn begin_file(&mut self) -> Result<()> {
		self.base.open(self.opts.dir.gen_directory.as_deref(), self.opts.common.filename.as_deref())?;
		let sym = self.protected_file();
		let out = &mut self.base.out;

		for line in &self.opts.decl.prefix_text {
			writeln!(out, "{}", line)?;
		}
		if let Some(sym) = sym {
			writeln!(out, "#ifndef {}", sym)?;
			writeln!(out, "#define {} 1", sym)?;
			writeln!(out)?;
		}

		writeln!(out, "#include <string>")?;
		writeln!(out)?;
		writeln!(out, "#include \"vulkan/vulkan.h\"")?;
		writeln!(out, "#include \"vk_layer_extension_utils.h\"")?;
		writeln!(out, "#include \"parameter_validation_utils.h\"")?;
		writeln!(out)?;
		writeln!(out, "#ifndef UNUSED_PARAMETER")?;
		writeln!(out, "#define UNUSED_PARAMETER(x) (void)(x)")?;
		writeln!(out, "#endif // UNUSED_PARAMETER")?;
		writeln!(out)?;
		writeln!(out, "namespace parameter_validation {{")?;
		Ok(())
	}

	fn end_file(&mut self) -> Result<()> {
		let protected = self.protected_file().is_some();
		let out = &mut self.base.out;

		writeln!(out)?;
		writeln!(out, "}} // namespace parameter_validation")?;
		if protected {
			writeln!(out)?;
			writeln!(out, "#endif")?;
		}
		self.base.close()
	}

	fn begin_feature(&mut self, feature: &Feature, emit: bool) -> Result<()> {
		self.base.begin_feature(feature, emit);
		self.pending_structs.clear();
		self.commands.clear();
		self.flags.clear();
		Ok(())
	}

	fn end_feature(&mut self) -> Result<()> {
		self.process_struct_member_data()?;

		if self.base.emit() {
			let defs = self.process_cmd_data()?;
			let flags = std::mem::take(&mut self.flags)
				.into_iter()
				.filter_map(|flag| {
					let bits = flag.replace("Flags", "FlagBits");
					self.flag_bits.get(&bits).map(|values| format!("const {} All{} = {};", flag, bits, values.join("|")))
				})
				.collect::<Vec<_>>();
			let protect = self.base.protect().map(String::from);
			let decl = &self.opts.decl;
			let out = &mut self.base.out;

			writeln!(out)?;
			if let Some(protect) = &protect {
				writeln!(out, "#ifdef {}", protect)?;
			}
			for flag in &flags {
				writeln!(out, "{}", flag)?;
			}
			writeln!(out)?;

			if !defs.is_empty() {
				if let Some(pp) = decl.protect_proto {
					writeln!(out, "{} {}", pp, decl.protect_proto_str.as_deref().unwrap_or_default())?;
				}
				write!(out, "{}", defs.join("\n"))?;
				if decl.protect_proto.is_some() {
					writeln!(out, "#endif")?;
				}
			}

			match &protect {
				Some(protect) => writeln!(out, "#endif /* {} */", protect)?,
				None => writeln!(out)?
			}
		}

		self.commands.clear();
		self.base.end_feature();
		Ok(())
	}

	fn gen_type(&mut self, ty: &TypeInfo) -> Result<()> {
		match ty.category {
			Some(c) if c.is_aggregate() => return self.gen_struct(ty),
			Some(TypeCategory::Handle) => {
				self.handle_types.insert(ty.name.clone());
			}
			Some(TypeCategory::Bitmask) => {
				self.bitmask_types.insert(ty.name.clone());
				self.flags.insert(ty.name.clone());
			}
			_ => ()
		}
		Ok(())
	}

	fn gen_struct(&mut self, ty: &TypeInfo) -> Result<()> {
		let lens = ty.members.iter()
			.filter_map(array_len)
			.collect::<BTreeSet<_>>();

		let mut members = Vec::with_capacity(ty.members.len());
		for m in &ty.members {
			let mut param = ParamData::new(m, &lens);
			if param.ty == "VkStructureType" {
				let value = ty.struct_type.clone().unwrap_or_else(|| gen_structure_type(&ty.name));
				self.struct_types.insert(ty.name.clone(), value);
			}
			// pNext is never NULL checked, static arrays cannot be NULL
			if param.name == "pNext" || param.static_array {
				param.optional = Optional::Yes;
			}
			if param.name == "pNext" {
				param.extstructs = m.validextensionstructs.clone();
			}
			param.condition = MEMBER_CONDITIONS.iter()
				.find(|(s, member, _)| *s == ty.name && *member == param.name)
				.map(|(.., condition)| *condition);
			members.push(param);
		}

		self.validated_structs.remove(&ty.name);
		self.pending_structs.insert(ty.name.clone(), members);
		Ok(())
	}

	fn gen_group(&mut self, group: &Group) -> Result<()> {
		if group.name == "VkStructureType" {
			return Ok(());
		}

		if group.name.contains("FlagBits") {
			let bits = group.enums.iter()
				.filter(|e| enumerant_selected(e, &self.add_extensions, self.opts.common.default_extensions.as_deref()))
				.map(|e| e.name.clone())
				.collect::<Vec<_>>();
			if !bits.is_empty() {
				self.flag_bits.insert(group.name.clone(), bits);
			}
			return Ok(());
		}

		let name = GroupName::new(&group.name);
		if name.is_enum() {
			self.enum_ranges.insert(group.name.clone(), (name.constant("BEGIN_RANGE"), name.constant("END_RANGE")));
		}
		Ok(())
	}

	fn gen_cmd(&mut self, cmd: &CommandInfo) -> Result<()> {
		if BLACKLIST.contains(&cmd.name.as_str()) {
			return Ok(());
		}

		let lens = cmd.params.iter()
			.filter_map(array_len)
			.collect::<BTreeSet<_>>();
		self.commands.push(CommandData {
			name:   cmd.name.clone(),
			params: cmd.params.iter().map(|p| ParamData::new(p, &lens)).collect(),
			proto:  make_c_decls(&self.opts.decl, cmd).proto
		});
		Ok(())
	}
}
