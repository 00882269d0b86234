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

//! Valid usage, host synchronization, command properties and return code includes.

use {
	super::*,
	crate::options::ValidityGeneratorOptions,
	std::{io::Write, collections::BTreeSet}
};

pub(crate) const BANNER: &str = "// WARNING: DO NOT MODIFY! This file is automatically generated from the vk.xml registry";

pub fn pname(name: &str) -> String {
	format!("pname:{}", name)
}

pub fn sname(name: &str) -> String {
	format!("sname:{}", name)
}

pub fn basetype(name: &str) -> String {
	format!("basetype:{}", name)
}

pub fn elink(name: &str) -> String {
	format!("elink:{}", name)
}

pub fn ename(name: &str) -> String {
	format!("ename:{}", name)
}

pub fn flink(name: &str) -> String {
	format!("flink:{}", name)
}

/// `a`, `a or b`, `a, b or c`.
fn join_or(items: &[String]) -> String {
	match items {
		[] => String::new(),
		[one] => one.clone(),
		[init @ .., last] => format!("{} or {}", init.join(", "), last)
	}
}

fn title_case(s: &str) -> String {
	let mut prev_alpha = false;
	s.chars()
		.map(|c| {
			let c2 = if prev_alpha { c.to_ascii_lowercase() } else { c.to_ascii_uppercase() };
			prev_alpha = c.is_alphabetic();
			c2
		})
		.collect()
}

fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
		None => String::new()
	}
}

/// Whether a handle parameter may be absent, either because it is optional itself or
/// because one of its lengths is.
pub fn is_handle_optional(param: &Member, params: &[Member]) -> bool {
	if param.optional.is_some() || param.noautovalidity {
		return true;
	}

	param.lengths().into_iter()
		.filter(|l| *l != "null-terminated" && *l != "1")
		.any(|l| params.iter().any(|p| p.name() == l && p.optional.is_some()))
}

/// The `VkStructureType` enumerant of a struct, derived from its name.
pub fn structure_type_name(struct_name: &str) -> String {
	static WORDS: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
	let words = WORDS.get_or_init(|| Regex::new(r"([A-Z][a-z]+)|([A-Z][A-Z]+)").expect("valid pattern"));

	let mut s = String::new();
	for word in words.find_iter(struct_name) {
		match word.as_str() {
			"Vk" => s.push_str("VK_STRUCTURE_TYPE_"),
			word => {
				s.push_str(&word.to_uppercase());
				s.push('_');
			}
		}
	}
	s.pop();
	s
}

/// The conditional start of a parameter's line, e.g. `* If pname:pData is not `NULL`, `.
fn pre_chunk(registry: &Registry, param: &Member, params: &[Member]) -> String {
	let mut s = "* ".to_string();

	if param.is_static_array() {
		s.push_str("Any given element of ");
	} else if param.len.is_some() {
		let mut optional_lengths = Vec::new();
		for length in param.lengths().into_iter().filter(|l| *l != "null-terminated" && *l != "1") {
			for other in params.iter().filter(|p| p.name() == length && p.optional.is_some()) {
				optional_lengths.push(match other.is_pointer() {
					true => format!("the value referenced by {}", pname(length)),
					false => pname(length)
				});
			}
		}

		if !optional_lengths.is_empty() || param.optional.is_some() {
			s.push_str("If ");
			match optional_lengths.len() {
				0 => (),
				1 => s.push_str(&format!("{} is not `0`, ", optional_lengths[0])),
				_ => s.push_str(&format!("{} are not `0`, ", optional_lengths.join(" or ")))
			}
			if !optional_lengths.is_empty() && param.optional.is_some() {
				s.push_str("and ");
			}
			if param.optional.is_some() {
				s.push_str(&format!("{} is not `NULL`, ", pname(param.name())));
			}
		}
	} else if let Some(optional) = &param.optional {
		let ty = param.type_name();
		if registry.type_category(ty) != Some(TypeCategory::Bitmask) && optional.split(',').next() == Some("true") {
			let none = if param.is_pointer() || registry.is_dispatchable(ty) {
				"`NULL`"
			} else if registry.type_category(ty) == Some(TypeCategory::Handle) {
				"sname:VK_NULL_HANDLE"
			} else {
				"`0`"
			};
			s.push_str(&format!("If {} is not {}, ", pname(param.name()), none));
		}
	}
	s
}

/// The valid usage text of one construct.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidityBlocks {
	pub validity:       Option<String>,
	pub threadsafety:   Option<String>,
	pub properties:     Option<String>,
	pub success_codes:  Option<String>,
	pub error_codes:    Option<String>
}

pub struct ValidityOutputGenerator<'a> {
	base:         GenBase<'a>,
	opts:         ValidityGeneratorOptions,
	always_valid: BTreeMap<String, bool>
}

impl<'a> ValidityOutputGenerator<'a> {
	pub fn new(registry: &'a Registry, opts: ValidityGeneratorOptions) -> Self {
		Self { base: GenBase::new(registry), opts, always_valid: BTreeMap::new() }
	}

	fn write_include(&self, dir: &str, name: &str, blocks: &ValidityBlocks) -> Result<()> {
		let path = self.opts.dir.dir().join(dir).join(format!("{}.txt", name));
		if !self.base.emit() {
			log::debug!("skipping include file `{}` of feature `{}`", path.display(), self.base.feature_name());
			return Ok(());
		}

		log::debug!("generating include file `{}`", path.display());
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		let mut file = io::BufWriter::new(fs::File::create(&path)?);
		write_blocks(&mut file, blocks)?;
		file.flush()?;
		Ok(())
	}

	/// Whether a struct needs no valid usage statements at all, memoized per struct.
	pub fn is_struct_always_valid(&mut self, name: &str) -> bool {
		if let Some(&valid) = self.always_valid.get(name) {
			return valid;
		}

		self.always_valid.insert(name.to_string(), true);
		let valid = self.check_struct_always_valid(name);
		self.always_valid.insert(name.to_string(), valid);
		valid
	}

	fn check_struct_always_valid(&mut self, name: &str) -> bool {
		let registry = self.base.registry;
		let ty = match registry.get_type(name) {
			Some(ty) => ty,
			None => return true
		};

		if ty.validity.is_some() {
			return false;
		}

		for member in &ty.members {
			let member_ty = member.type_name();
			if member.name() == "pNext" || member.name() == "sType" {
				return false;
			}

			if member_ty == "void" || member_ty == "char" || member.len.is_some() || member.is_pointer() {
				if !self.line_for_parameter(member, &ty.members, "").is_empty() {
					return false;
				}
				continue;
			}

			if member.returnedonly {
				return false;
			}

			match registry.type_category(member_ty) {
				Some(TypeCategory::Handle | TypeCategory::Enum | TypeCategory::Bitmask) => return false,
				Some(TypeCategory::Struct | TypeCategory::Union) if !self.is_struct_always_valid(member_ty) => return false,
				_ => ()
			}
		}
		true
	}

	fn line_for_parameter(&mut self, param: &Member, params: &[Member], typetext: &str) -> String {
		match param.noautovalidity {
			true => String::new(),
			false => self.intro_chunk(param, params, typetext)
		}
	}

	fn intro_chunk(&mut self, param: &Member, params: &[Member], typetext: &str) -> String {
		let registry = self.base.registry;
		let ty = param.type_name();
		let mut s = pre_chunk(registry, param, params);
		s.push_str(&pname(param.name()));
		s.push_str(" must: be ");

		if param.len.is_some() {
			let lengths = param.lengths();
			match lengths[0] {
				"null-terminated" => s.push_str("a null-terminated "),
				"1" => s.push_str("a pointer to "),
				first => {
					s.push_str("a pointer to an array of ");
					match first.contains("latexmath:") {
						true => s.push_str(first),
						false => s.push_str(&pname(first))
					}
					s.push(' ');
				}
			}

			for length in &lengths[1..] {
				match *length {
					"null-terminated" => s.push_str("null-terminated "),
					"1" => s.push_str("pointers to "),
					length => {
						s.push_str("pointers to arrays of ");
						match length.contains("latex:") {
							true => s.push_str(length),
							false => s.push_str(&pname(length))
						}
						s.push(' ');
					}
				}
			}

			let last = lengths[lengths.len() - 1];
			match ty {
				"void" if last == "1" => {
					let cut = if lengths.len() > 1 { "s to ".len() } else { " to ".len() };
					s.truncate(s.len().saturating_sub(cut));
				}
				"void" => s.push_str("byte"),
				"char" if last == "null-terminated" => s.push_str("string"),
				"char" => s.push_str("char value"),
				_ if param.is_const() => {
					let plain = matches!(registry.type_category(ty),
						None | Some(TypeCategory::Struct | TypeCategory::Union | TypeCategory::Basetype));
					if !plain || !self.is_struct_always_valid(ty) {
						s.push_str("valid ");
					}
				}
				_ => ()
			}

			s.push_str(typetext);
			if lengths.len() > 1 || (lengths[0] != "1" && lengths[0] != "null-terminated") {
				s.push('s');
			}
		} else if param.is_pointer() {
			let depth = param.pointer_depth();
			for _ in 0..depth {
				s.push_str("a pointer to ");
			}

			if ty == "void" {
				if depth == 1 && param.optional.is_some() {
					return String::new();
				}
				s.truncate(s.len().saturating_sub(" to ".len()));
			} else {
				s.push_str("a ");
				if param.is_const() {
					s.push_str("valid ");
				}
			}
			s.push_str(typetext);
		} else {
			s.push_str("a valid ");
			s.push_str(typetext);
		}

		s.push('\n');
		if registry.type_category(ty) == Some(TypeCategory::Bitmask) && param.optional.is_none() {
			s.push_str("* ");
			if param.len.is_some() {
				s.push_str("Each element of ");
			}
			s.push_str(&format!("pname:{} mustnot: be `0`\n", param.name()));
		}
		s
	}

	fn validation_line(&mut self, param: &Member, params: &[Member], category: Option<TypeCategory>) -> String {
		let registry = self.base.registry;
		let ty = param.type_name();
		let indirect = param.len.is_some() || param.is_pointer();

		if ty == "void" || ty == "char" {
			return self.line_for_parameter(param, params, "");
		}

		match category {
			Some(TypeCategory::Bitmask) => {
				let bits = ty.replace("Flags", "FlagBits");
				if !registry.has_group(&bits) {
					format!("* {} must: be `0`\n", pname(param.name()))
				} else if param.len.is_some() {
					self.line_for_parameter(param, params, &format!("combinations of {} value", elink(&bits)))
				} else {
					self.line_for_parameter(param, params, &format!("combination of {} values", elink(&bits)))
				}
			}
			Some(TypeCategory::Handle) => self.line_for_parameter(param, params, &format!("{} handle", sname(ty))),
			Some(TypeCategory::Enum) => self.line_for_parameter(param, params, &format!("{} value", elink(ty))),
			Some(c @ (TypeCategory::Struct | TypeCategory::Union)) => {
				if indirect || !self.is_struct_always_valid(ty) {
					let what = if c == TypeCategory::Struct { "structure" } else { "union" };
					self.line_for_parameter(param, params, &format!("{} {}", sname(ty), what))
				} else {
					String::new()
				}
			}
			_ if indirect => self.line_for_parameter(param, params, &format!("{} value", basetype(ty))),
			_ => String::new()
		}
	}

	/// All valid usage statements of a command or struct, `None` if there are none.
	pub fn valid_usage_statements(&mut self, cmd: Option<&CommandInfo>, block: &str, params: &[Member], usages: &[String]) -> Option<String> {
		let registry = self.base.registry;
		let mut s = String::new();
		let mut handles = Vec::new();
		let mut any_optional = false;
		let mut parents: Vec<(String, Vec<String>)> = Vec::new();
		let mut array_lengths = BTreeSet::new();

		for param in params {
			let ty = param.type_name();
			let category = registry.type_category(ty);

			match (ty, param.name()) {
				("VkStructureType", "sType") => s.push_str(&format!("* {} must: be {}\n",
					pname(param.name()), ename(&structure_type_name(block)))),
				("void", "pNext") => s.push_str(&extension_pointer_line(param)),
				_ => s.push_str(&self.validation_line(param, params, category))
			}

			if category == Some(TypeCategory::Handle) && (!param.is_pointer() || param.is_const()) {
				if let Some(parent) = registry.handle_parent(ty) {
					handles.push(param);
					any_optional |= is_handle_optional(param, params);

					let mut ancestor = Some(parent);
					while let Some(a) = ancestor.filter(|a| !registry.is_dispatchable(a)) {
						ancestor = registry.handle_parent(a);
					}

					if let Some(ancestor) = ancestor {
						let reference = match param.len.is_some() {
							true => format!("the elements of {}", pname(param.name())),
							false => pname(param.name())
						};
						match parents.iter_mut().find(|(k, _)| k == ancestor) {
							Some((_, v)) => v.push(reference),
							None => parents.push((ancestor.to_string(), vec![reference]))
						}
					}
				}
			}

			array_lengths.extend(param.lengths());
		}

		if let Some(cmd) = cmd {
			let queues = cmd.queues.as_deref()
				.map(|q| q.split(',')
					.filter(|q| !q.is_empty())
					.map(|q| q.replace('_', " "))
					.collect::<Vec<_>>())
				.unwrap_or_default();

			if block.contains("vkQueue") && !queues.is_empty() {
				s.push_str(&format!("* The pname:queue must: support {} operations\n", join_or(&queues)));
			}

			if block.contains("vkCmd") {
				s.push_str("* pname:commandBuffer must: be in the recording state\n");
				if !queues.is_empty() {
					s.push_str(&format!("* The sname:VkCommandPool that pname:commandBuffer was allocated from must: support {} operations\n",
						join_or(&queues)));
				}
				if let Some(renderpass) = cmd.renderpass.as_deref().filter(|r| *r != "both") {
					s.push_str(&format!("* This command must: only be called {} of a render pass instance\n", renderpass));
				}
				if let Some(level) = cmd.cmdbufferlevel.as_deref().filter(|l| *l != "primary,secondary") {
					s.push_str(&format!("* pname:commandBuffer must: be a {} sname:VkCommandBuffer\n", level));
				}
			}
		}

		for param in params.iter().filter(|p| array_lengths.contains(p.name()) && p.optional.is_none()) {
			let length = param.name();
			let dependents = params.iter()
				.filter(|p| p.len.as_deref() == Some(length))
				.collect::<Vec<_>>();
			let optional = dependents.iter()
				.filter(|p| p.optional.as_deref() == Some("true") || p.noautovalidity)
				.map(|p| pname(p.name()))
				.collect::<Vec<_>>();

			s.push_str("* ");
			if !optional.is_empty() && optional.len() == dependents.len() {
				s.push_str("If ");
				match optional.as_slice() {
					[one] => s.push_str(&format!("{} is ", one)),
					[init @ .., last] => s.push_str(&format!("any of {}, and {} are ", init.join(", "), last)),
					[] => ()
				}
				s.push_str("not `NULL`, ");
				if param.is_pointer() {
					s.push_str("the value referenced by ");
				}
			} else if param.is_pointer() {
				s.push_str("The value referenced by ");
			}
			s.push_str(&format!("{} must: be greater than `0`\n", pname(length)));
		}

		for param in handles {
			s.push_str(&handle_parent_line(registry, param, params));
		}

		loop {
			let mut orphans = 0;
			let keys = parents.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>();
			for key in keys {
				let mut ancestor = registry.handle_parent(&key);
				while let Some(a) = ancestor.filter(|a| !parents.iter().any(|(k, _)| k == *a)) {
					ancestor = registry.handle_parent(a);
				}

				match ancestor.and_then(|a| parents.iter().position(|(k, _)| k == a)) {
					Some(_) => {
						let i = parents.iter().position(|(k, _)| *k == key).unwrap_or_default();
						let (_, merged) = parents.remove(i);
						if let Some((_, v)) = parents.iter_mut().find(|(k, _)| Some(k.as_str()) == ancestor) {
							v.extend(merged);
						}
					}
					None => orphans += 1
				}
			}
			if orphans >= parents.len() {
				break;
			}
		}

		for (parent, objects) in &parents {
			if let [init @ .., last] = objects.as_slice() {
				if init.is_empty() {
					continue;
				}
				s.push_str(&format!("* Each of {} and {}{} must: have been created, allocated or retrieved from the same {}\n",
					init.join(", "), last, if any_optional { " that are valid handles" } else { "" }, sname(parent)));
			}
		}

		for usage in usages {
			s.push_str(&format!("* {}\n", usage));
		}

		match s.is_empty() {
			true => None,
			false => Some(s)
		}
	}

	pub fn gen_blocks_for_cmd(&mut self, cmd: &CommandInfo) -> ValidityBlocks {
		let usages = merged_usages(&cmd.name, cmd.validity.as_deref(), &cmd.added_usages, &cmd.removed_usages);
		ValidityBlocks {
			validity:      self.valid_usage_statements(Some(cmd), &cmd.name, &cmd.params, &usages),
			threadsafety:  thread_safety_block(&cmd.name, &cmd.params, &cmd.implicit_externsync),
			properties:    command_properties_entry(cmd),
			success_codes: cmd.successcodes.as_deref().map(codes),
			error_codes:   cmd.errorcodes.as_deref().map(codes)
		}
	}
}

fn merged_usages(name: &str, validity: Option<&[String]>, added: &[String], removed: &[String]) -> Vec<String> {
	let mut usages = validity.unwrap_or_default().to_vec();
	usages.extend(added.iter().cloned());
	for usage in removed {
		match usages.iter().position(|u| u == usage) {
			Some(i) => {
				usages.remove(i);
			}
			None => log::warn!("cannot remove usage `{}` of `{}`, it does not exist", usage, name)
		}
	}
	usages
}

fn extension_pointer_line(param: &Member) -> String {
	let mut s = format!("* {} must: be `NULL`", pname(param.name()));
	match param.validextensionstructs.as_slice() {
		[] => (),
		[one] => s.push_str(&format!(", or a pointer to a valid instance of {}", one)),
		[init @ .., last] => s.push_str(&format!(", or a pointer to a valid instance of {} or slink:{}",
			init.iter().map(|s| format!("slink:{}", s)).collect::<Vec<_>>().join(", "), last))
	}
	s.push('\n');
	s
}

fn handle_parent_line(registry: &Registry, param: &Member, params: &[Member]) -> String {
	let parent = match registry.handle_parent(param.type_name()) {
		Some(parent) => parent,
		None => return String::new()
	};
	let reference = match params.iter().rev().find(|p| p.type_name() == parent) {
		Some(p) => p.name(),
		None => return String::new()
	};

	let mut s = "* ".to_string();
	match (is_handle_optional(param, params), param.len.is_some()) {
		(true, true) => s.push_str(&format!("Each element of {} that is a valid handle", pname(param.name()))),
		(true, false) => s.push_str(&format!("If {} is a valid handle, it", pname(param.name()))),
		(false, true) => s.push_str(&format!("Each element of {}", pname(param.name()))),
		(false, false) => s.push_str(&pname(param.name()))
	}
	s.push_str(&format!(" must: have been created, allocated or retrieved from {}\n", pname(reference)));
	s
}

/// Host synchronization requirements of a command or struct, `None` if there are none.
pub fn thread_safety_block(name: &str, params: &[Member], implicit: &[String]) -> Option<String> {
	let mut s = String::new();

	if name.contains("vkCmd") {
		s.push_str("* Host access to the sname:VkCommandPool that pname:commandBuffer was allocated from must: be externally synchronized\n");
	}

	for param in params {
		for sync in param.externsync.iter().flat_map(|e| e.split(',')) {
			s.push_str("* Host access to ");
			match sync {
				"true" if param.len.is_some() => s.push_str(&format!("each member of {}", pname(param.name()))),
				"true" if param.is_pointer() => s.push_str(&format!("the object referenced by {}", pname(param.name()))),
				"true" => s.push_str(&pname(param.name())),
				sync => s.push_str(&pname(sync))
			}
			s.push_str(" must: be externally synchronized\n");
		}
	}

	for param in implicit {
		s.push_str(&format!("* Host access to {} must: be externally synchronized\n", param));
	}

	match s.is_empty() {
		true => None,
		false => Some(s)
	}
}

/// A row of the command properties table.
pub fn command_properties_entry(cmd: &CommandInfo) -> Option<String> {
	let queues = |q: &str| q.to_uppercase().split(',').collect::<Vec<_>>().join(" + \n");

	if cmd.name.contains("vkCmd") {
		let levels = title_case(cmd.cmdbufferlevel.as_deref().unwrap_or_default())
			.split(',')
			.collect::<Vec<_>>()
			.join(" + \n");
		Some(format!("|{}|{}|{}", levels,
			capitalize(cmd.renderpass.as_deref().unwrap_or_default()),
			queues(cmd.queues.as_deref().unwrap_or_default())))
	} else if cmd.name.contains("vkQueue") {
		Some(format!("|-|-|{}", cmd.queues.as_deref().map_or_else(|| "Any".to_string(), queues)))
	} else {
		None
	}
}

fn codes(codes: &str) -> String {
	format!("* ename:{}", codes.split(',').collect::<Vec<_>>().join("\n* ename:"))
}

fn write_block_start(writer: &mut impl io::Write, title: &str) -> io::Result<()> {
	writeln!(writer, "ifndef::doctype-manpage[]")?;
	writeln!(writer, ".{}", title)?;
	writeln!(writer, "{}", "*".repeat(80))?;
	writeln!(writer, "endif::doctype-manpage[]")?;
	writeln!(writer, "ifdef::doctype-manpage[]")?;
	writeln!(writer, "{}", title)?;
	writeln!(writer, "{}", "-".repeat(title.len()))?;
	writeln!(writer, "endif::doctype-manpage[]")
}

fn write_block_end(writer: &mut impl io::Write) -> io::Result<()> {
	writeln!(writer, "ifndef::doctype-manpage[]")?;
	writeln!(writer, "{}", "*".repeat(80))?;
	writeln!(writer, "endif::doctype-manpage[]")?;
	writeln!(writer)
}

/// Writes the include file of a construct.
pub fn write_blocks(writer: &mut impl io::Write, blocks: &ValidityBlocks) -> io::Result<()> {
	writeln!(writer, "{}", BANNER)?;

	if let Some(validity) = &blocks.validity {
		write_block_start(writer, "Valid Usage")?;
		write!(writer, "{}", validity)?;
		write_block_end(writer)?;
	}

	if let Some(threadsafety) = &blocks.threadsafety {
		write_block_start(writer, "Host Synchronization")?;
		write!(writer, "{}", threadsafety)?;
		write_block_end(writer)?;
	}

	if let Some(entry) = &blocks.properties {
		write_block_start(writer, "Command Properties")?;
		writeln!(writer, "[options=\"header\", width=\"100%\"]")?;
		writeln!(writer, "|=====================")?;
		writeln!(writer, "|Command Buffer Levels|Render Pass Scope|Supported Queue Types")?;
		writeln!(writer, "{}", entry)?;
		writeln!(writer, "|=====================")?;
		write_block_end(writer)?;
	}

	if blocks.success_codes.is_some() || blocks.error_codes.is_some() {
		write_block_start(writer, "Return Codes")?;
		if let Some(codes) = &blocks.success_codes {
			writeln!(writer, "ifndef::doctype-manpage[]")?;
			writeln!(writer, "<<fundamentals-successcodes,Success>>::")?;
			writeln!(writer, "endif::doctype-manpage[]")?;
			writeln!(writer, "ifdef::doctype-manpage[]")?;
			writeln!(writer, "On success, this command returns::")?;
			writeln!(writer, "endif::doctype-manpage[]")?;
			writeln!(writer, "{}", codes)?;
		}
		if let Some(codes) = &blocks.error_codes {
			writeln!(writer, "ifndef::doctype-manpage[]")?;
			writeln!(writer, "<<fundamentals-errorcodes,Failure>>::")?;
			writeln!(writer, "endif::doctype-manpage[]")?;
			writeln!(writer, "ifdef::doctype-manpage[]")?;
			writeln!(writer, "On failure, this command returns::")?;
			writeln!(writer, "endif::doctype-manpage[]")?;
			writeln!(writer, "{}", codes)?;
		}
		write_block_end(writer)?;
	}
	Ok(())
}

impl OutputGenerator for ValidityOutputGenerator<'_> {
	fn active_feature(&self) -> Option<&ActiveFeature> {
		self.base.feature.as_ref()
	}

	fn begin_file(&mut self) -> Result<()> {
		Ok(())
	}

	fn end_file(&mut self) -> Result<()> {
		Ok(())
	}

	fn begin_feature(&mut self, feature: &Feature, emit: bool) -> Result<()> {
		self.base.begin_feature(feature, emit);
		Ok(())
	}

	fn end_feature(&mut self) -> Result<()> {
		self.base.end_feature();
		Ok(())
	}

	fn gen_type(&mut self, ty: &TypeInfo) -> Result<()> {
		match ty.category {
			Some(c) if c.is_aggregate() => self.gen_struct(ty),
			_ => Ok(())
		}
	}

	fn gen_struct(&mut self, ty: &TypeInfo) -> Result<()> {
		if ty.returnedonly {
			return self.write_include("validity/structs", &ty.name, &ValidityBlocks::default());
		}

		let usages = merged_usages(&ty.name, ty.validity.as_deref(), &ty.added_usages, &ty.removed_usages);
		let blocks = ValidityBlocks {
			validity:     self.valid_usage_statements(None, &ty.name, &ty.members, &usages),
			threadsafety: thread_safety_block(&ty.name, &ty.members, &[]),
			..ValidityBlocks::default()
		};
		self.write_include("validity/structs", &ty.name, &blocks)
	}

	fn gen_cmd(&mut self, cmd: &CommandInfo) -> Result<()> {
		let blocks = self.gen_blocks_for_cmd(cmd);
		self.write_include("validity/protos", &cmd.name, &blocks)
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq, crate::options::*};

	const REGISTRY: &str = r#"<registry>
	<types>
		<type category="handle"><type>VK_DEFINE_HANDLE</type>(<name>VkInstance</name>)</type>
		<type category="handle" parent="VkInstance"><type>VK_DEFINE_HANDLE</type>(<name>VkPhysicalDevice</name>)</type>
		<type category="handle" parent="VkPhysicalDevice"><type>VK_DEFINE_HANDLE</type>(<name>VkDevice</name>)</type>
		<type category="handle" parent="VkDevice"><type>VK_DEFINE_HANDLE</type>(<name>VkCommandBuffer</name>)</type>
		<type category="handle" parent="VkDevice"><type>VK_DEFINE_NON_DISPATCHABLE_HANDLE</type>(<name>VkFence</name>)</type>
		<type category="handle" parent="VkDevice"><type>VK_DEFINE_NON_DISPATCHABLE_HANDLE</type>(<name>VkSemaphore</name>)</type>
		<type requires="VkCullModeFlagBits" category="bitmask">typedef <type>VkFlags</type> <name>VkCullModeFlags</name>;</type>
		<type category="bitmask">typedef <type>VkFlags</type> <name>VkFenceCreateFlags</name>;</type>
		<type name="VkStructureType" category="enum"/>
		<type category="struct" name="VkOffset2D">
			<member><type>int32_t</type> <name>x</name></member>
			<member><type>int32_t</type> <name>y</name></member>
		</type>
		<type category="struct" name="VkRect2D">
			<member><type>VkOffset2D</type> <name>offset</name></member>
		</type>
		<type category="struct" name="VkFenceCreateInfo">
			<member><type>VkStructureType</type> <name>sType</name></member>
			<member>const <type>void</type>* <name>pNext</name></member>
			<member optional="true"><type>VkFenceCreateFlags</type> <name>flags</name></member>
		</type>
		<type category="struct" name="VkSurfaceCapabilitiesKHR" returnedonly="true">
			<member><type>uint32_t</type> <name>minImageCount</name></member>
		</type>
	</types>
	<enums name="VkCullModeFlagBits" type="bitmask">
		<enum bitpos="0" name="VK_CULL_MODE_FRONT_BIT"/>
	</enums>
	<commands>
		<command successcodes="VK_SUCCESS,VK_TIMEOUT" errorcodes="VK_ERROR_DEVICE_LOST">
			<proto><type>VkResult</type> <name>vkWaitForFences</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param><type>uint32_t</type> <name>fenceCount</name></param>
			<param len="fenceCount">const <type>VkFence</type>* <name>pFences</name></param>
		</command>
		<command>
			<proto><type>void</type> <name>vkDestroyFence</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param optional="true" externsync="true"><type>VkFence</type> <name>fence</name></param>
		</command>
		<command>
			<proto><type>void</type> <name>vkResetFences</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param><type>VkFence</type> <name>fence</name></param>
			<param><type>VkSemaphore</type> <name>semaphore</name></param>
		</command>
		<command queues="graphics,compute" renderpass="outside" cmdbufferlevel="primary">
			<proto><type>void</type> <name>vkCmdSetCullMode</name></proto>
			<param externsync="true"><type>VkCommandBuffer</type> <name>commandBuffer</name></param>
			<param><type>VkCullModeFlags</type> <name>cullMode</name></param>
			<param><type>VkFenceCreateFlags</type> <name>reserved</name></param>
		</command>
		<command>
			<proto><type>VkResult</type> <name>vkCreateFence</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param>const <type>VkFenceCreateInfo</type>* <name>pCreateInfo</name></param>
			<param optional="true">const <type>VkOffset2D</type>* <name>pOffset</name></param>
			<param optional="true"><type>void</type>* <name>pUserData</name></param>
			<param len="null-terminated">const <type>char</type>* <name>pName</name></param>
		</command>
	</commands>
</registry>"#;

	fn statements(gen: &mut ValidityOutputGenerator, name: &str) -> Option<String> {
		let registry = gen.base.registry;
		gen.gen_blocks_for_cmd(&registry.commands[name]).validity
	}

	#[test]
	fn always_valid_structs() {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = ValidityOutputGenerator::new(&reg, ValidityGeneratorOptions::default());

		assert!(gen.is_struct_always_valid("VkOffset2D"));
		assert!(gen.is_struct_always_valid("VkRect2D"));
		assert!(!gen.is_struct_always_valid("VkFenceCreateInfo"));

		let mut reg = reg.clone();
		let member = reg.types["VkFenceCreateInfo"].members[1].clone();
		reg.types.get_mut("VkOffset2D").unwrap().members.push(member);
		let mut gen = ValidityOutputGenerator::new(&reg, ValidityGeneratorOptions::default());
		assert!(!gen.is_struct_always_valid("VkOffset2D"));
		assert!(!gen.is_struct_always_valid("VkRect2D"));
	}

	#[test]
	fn returned_only_members() {
		let reg = Registry::from_xml(r#"<registry><types>
			<type category="struct" name="VkExtent2D">
				<member><type>uint32_t</type> <name>width</name></member>
			</type>
			<type category="struct" name="VkLimits">
				<member returnedonly="true"><type>uint32_t</type> <name>maxWidth</name></member>
			</type>
		</types></registry>"#.as_bytes()).unwrap();
		let mut gen = ValidityOutputGenerator::new(&reg, ValidityGeneratorOptions::default());

		assert!(gen.is_struct_always_valid("VkExtent2D"));
		assert!(!gen.is_struct_always_valid("VkLimits"));
	}

	#[test]
	fn command_pool_synchronization() {
		assert_eq!(thread_safety_block("vkCmdDraw", &[], &[]).unwrap(),
			"* Host access to the sname:VkCommandPool that pname:commandBuffer was allocated from must: be externally synchronized\n");
		assert_eq!(thread_safety_block("vkDeviceWaitIdle", &[], &[]), None);
	}

	#[test]
	fn struct_type_names() {
		assert_eq!(structure_type_name("VkFenceCreateInfo"), "VK_STRUCTURE_TYPE_FENCE_CREATE_INFO");
		assert_eq!(structure_type_name("VkSwapchainCreateInfoKHR"), "VK_STRUCTURE_TYPE_SWAPCHAIN_CREATE_INFO_KHR");
	}

	#[test]
	fn arrays_and_common_parents() {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = ValidityOutputGenerator::new(&reg, ValidityGeneratorOptions::default());

		assert_eq!(statements(&mut gen, "vkWaitForFences").unwrap(), "\
* pname:device must: be a valid sname:VkDevice handle
* pname:pFences must: be a pointer to an array of pname:fenceCount valid sname:VkFence handles
* pname:fenceCount must: be greater than `0`
* Each element of pname:pFences must: have been created, allocated or retrieved from pname:device
* Each of pname:device and the elements of pname:pFences must: have been created, allocated or retrieved from the same sname:VkPhysicalDevice
");

		assert_eq!(statements(&mut gen, "vkResetFences").unwrap(), "\
* pname:device must: be a valid sname:VkDevice handle
* pname:fence must: be a valid sname:VkFence handle
* pname:semaphore must: be a valid sname:VkSemaphore handle
* pname:fence must: have been created, allocated or retrieved from pname:device
* pname:semaphore must: have been created, allocated or retrieved from pname:device
* Each of pname:device, pname:fence and pname:semaphore must: have been created, allocated or retrieved from the same sname:VkPhysicalDevice
");
	}

	#[test]
	fn optional_handles_and_lengths() {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = ValidityOutputGenerator::new(&reg, ValidityGeneratorOptions::default());

		assert_eq!(statements(&mut gen, "vkDestroyFence").unwrap(), "\
* pname:device must: be a valid sname:VkDevice handle
* If pname:fence is not sname:VK_NULL_HANDLE, pname:fence must: be a valid sname:VkFence handle
* If pname:fence is a valid handle, it must: have been created, allocated or retrieved from pname:device
* Each of pname:device and pname:fence that are valid handles must: have been created, allocated or retrieved from the same sname:VkPhysicalDevice
");

		let mut cmd = reg.commands["vkWaitForFences"].clone();
		cmd.params[2].optional = Some("true".to_string());
		let s = gen.valid_usage_statements(Some(&cmd), &cmd.name, &cmd.params, &[]).unwrap();
		assert!(s.contains("* If pname:pFences is not `NULL`, pname:pFences must: be a pointer to an array of pname:fenceCount valid sname:VkFence handles\n"));
		assert!(s.contains("* If pname:pFences is not `NULL`, pname:fenceCount must: be greater than `0`\n"));
	}

	#[test]
	fn pointers() {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = ValidityOutputGenerator::new(&reg, ValidityGeneratorOptions::default());

		assert_eq!(statements(&mut gen, "vkCreateFence").unwrap(), "\
* pname:device must: be a valid sname:VkDevice handle
* pname:pCreateInfo must: be a pointer to a valid sname:VkFenceCreateInfo structure
* If pname:pOffset is not `NULL`, pname:pOffset must: be a pointer to a valid sname:VkOffset2D structure
* pname:pName must: be a null-terminated string
");

		let info = &reg.types["VkFenceCreateInfo"];
		assert_eq!(gen.valid_usage_statements(None, &info.name, &info.members, &["pname:flags is reserved".to_string()]).unwrap(), "\
* pname:sType must: be ename:VK_STRUCTURE_TYPE_FENCE_CREATE_INFO
* pname:pNext must: be `NULL`
* pname:flags must: be `0`
* pname:flags is reserved
");
	}

	#[test]
	fn command_buffer_commands() {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = ValidityOutputGenerator::new(&reg, ValidityGeneratorOptions::default());
		let blocks = gen.gen_blocks_for_cmd(&reg.commands["vkCmdSetCullMode"]);

		assert_eq!(blocks.validity.unwrap(), "\
* pname:commandBuffer must: be a valid sname:VkCommandBuffer handle
* pname:cullMode must: be a valid combination of elink:VkCullModeFlagBits values
* pname:cullMode mustnot: be `0`
* pname:reserved must: be `0`
* pname:commandBuffer must: be in the recording state
* The sname:VkCommandPool that pname:commandBuffer was allocated from must: support graphics or compute operations
* This command must: only be called outside of a render pass instance
* pname:commandBuffer must: be a primary sname:VkCommandBuffer
");
		assert_eq!(blocks.threadsafety.unwrap(), "\
* Host access to the sname:VkCommandPool that pname:commandBuffer was allocated from must: be externally synchronized
* Host access to pname:commandBuffer must: be externally synchronized
");
		assert_eq!(blocks.properties.unwrap(), "|Primary|Outside|GRAPHICS + \nCOMPUTE");
		assert_eq!(blocks.success_codes, None);
	}

	#[test]
	fn include_files() {
		let dir = tempfile::tempdir().unwrap();
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = ValidityOutputGenerator::new(&reg, ValidityGeneratorOptions {
			dir: DirOptions::new(dir.path()),
			..ValidityGeneratorOptions::default()
		});

		gen.begin_feature(&Feature::default(), true).unwrap();
		gen.generate(Construct::Command(&reg.commands["vkWaitForFences"])).unwrap();
		gen.generate(Construct::Type(&reg.types["VkSurfaceCapabilitiesKHR"])).unwrap();
		gen.end_feature().unwrap();

		let s = std::fs::read_to_string(dir.path().join("validity/protos/vkWaitForFences.txt")).unwrap();
		let stars = "*".repeat(80);
		assert!(s.starts_with(&format!("{}\nifndef::doctype-manpage[]\n.Valid Usage\n{}\nendif::doctype-manpage[]\n\
ifdef::doctype-manpage[]\nValid Usage\n-----------\nendif::doctype-manpage[]\n* pname:device", BANNER, stars)));
		assert!(s.ends_with(&format!("\
ifndef::doctype-manpage[]
.Return Codes
{0}
endif::doctype-manpage[]
ifdef::doctype-manpage[]
Return Codes
------------
endif::doctype-manpage[]
ifndef::doctype-manpage[]
<<fundamentals-successcodes,Success>>::
endif::doctype-manpage[]
ifdef::doctype-manpage[]
On success, this command returns::
endif::doctype-manpage[]
* ename:VK_SUCCESS
* ename:VK_TIMEOUT
ifndef::doctype-manpage[]
<<fundamentals-errorcodes,Failure>>::
endif::doctype-manpage[]
ifdef::doctype-manpage[]
On failure, this command returns::
endif::doctype-manpage[]
* ename:VK_ERROR_DEVICE_LOST
ifndef::doctype-manpage[]
{0}
endif::doctype-manpage[]

", stars)));

		let s = std::fs::read_to_string(dir.path().join("validity/structs/VkSurfaceCapabilitiesKHR.txt")).unwrap();
		assert_eq!(s, format!("{}\n", BANNER));
	}
}
