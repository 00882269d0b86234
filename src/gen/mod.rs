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

//! The generator protocol shared by all back ends.
//!
//! A driver walks the registry one feature at a time and hands every required construct to an
//! [`OutputGenerator`] through [`OutputGenerator::generate`]:
//!
//! ```text
//! begin_file, (begin_feature, generate*, end_feature)*, end_file
//! ```

use {
	crate::{parse::*, error::{Error, Result}},
	regex::Regex,
	std::{io, fs, path::Path, cmp::Ordering, collections::BTreeMap, sync::OnceLock}
};

pub mod decl;
pub mod c;
pub mod doc;
pub mod py;
pub mod validity;
pub mod host_sync;
pub mod thread;
pub mod param_check;

pub use self::{
	c::COutputGenerator,
	doc::DocOutputGenerator,
	py::PyOutputGenerator,
	validity::ValidityOutputGenerator,
	host_sync::HostSyncOutputGenerator,
	thread::ThreadOutputGenerator,
	param_check::ParamCheckerOutputGenerator
};

/// Enumerant values of extensions start here.
pub const EXT_BASE: i64 = 1_000_000_000;
/// Every extension owns a block of this many enumerant values.
pub const EXT_BLOCK_SIZE: i64 = 1_000;

/// A construct handed to a generator.
#[derive(Copy, Clone, Debug)]
pub enum Construct<'a> {
	Type(&'a TypeInfo),
	Struct(&'a TypeInfo),
	Group(&'a Group),
	Enum(&'a Enumerant),
	Command(&'a CommandInfo)
}

impl Construct<'_> {
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Type(_)    => "type",
			Self::Struct(_)  => "struct",
			Self::Group(_)   => "group",
			Self::Enum(_)    => "enum",
			Self::Command(_) => "command"
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Type(v) | Self::Struct(v) => &v.name,
			Self::Group(v)                  => &v.name,
			Self::Enum(v)                   => &v.name,
			Self::Command(v)                => &v.name
		}
	}
}

/// The feature currently being generated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveFeature {
	pub name:    String,
	/// An additional preprocessor symbol guarding the feature.
	pub protect: Option<String>,
	/// Whether output is written for this feature or it is only traversed.
	pub emit:    bool
}

impl ActiveFeature {
	pub fn new(feature: &Feature, emit: bool) -> Self {
		Self { name: feature.name.clone(), protect: feature.protect.clone(), emit }
	}
}

/// A back end. The hooks default to doing nothing.
pub trait OutputGenerator {
	fn active_feature(&self) -> Option<&ActiveFeature>;

	fn begin_file(&mut self) -> Result<()>;

	fn end_file(&mut self) -> Result<()>;

	fn begin_feature(&mut self, feature: &Feature, emit: bool) -> Result<()>;

	fn end_feature(&mut self) -> Result<()>;

	fn gen_type(&mut self, _ty: &TypeInfo) -> Result<()> {
		Ok(())
	}

	fn gen_struct(&mut self, _ty: &TypeInfo) -> Result<()> {
		Ok(())
	}

	fn gen_group(&mut self, _group: &Group) -> Result<()> {
		Ok(())
	}

	fn gen_enum(&mut self, _enumerant: &Enumerant) -> Result<()> {
		Ok(())
	}

	fn gen_cmd(&mut self, _cmd: &CommandInfo) -> Result<()> {
		Ok(())
	}

	/// Dispatches a construct to its hook, failing if no feature is open.
	fn generate(&mut self, construct: Construct<'_>) -> Result<()> {
		validate_feature(self.active_feature(), construct.kind(), construct.name())?;
		match construct {
			Construct::Type(ty)     => self.gen_type(ty),
			Construct::Struct(ty)   => self.gen_struct(ty),
			Construct::Group(group) => self.gen_group(group),
			Construct::Enum(e)      => self.gen_enum(e),
			Construct::Command(cmd) => self.gen_cmd(cmd)
		}
	}
}

pub fn validate_feature(feature: Option<&ActiveFeature>, kind: &'static str, name: &str) -> Result<()> {
	match feature {
		Some(_) => Ok(()),
		None => {
			log::error!("attempt to generate {} `{}` when not in feature", kind, name);
			Err(Error::NotInFeature { kind, name: name.to_string() })
		}
	}
}

/// The destination of a generator.
pub enum Sink<'a> {
	Closed,
	Stdout(io::Stdout),
	File(io::BufWriter<fs::File>),
	Shared(&'a mut dyn io::Write)
}

impl io::Write for Sink<'_> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		match self {
			Self::Closed      => Err(io::Error::new(io::ErrorKind::NotConnected, "output file is not open")),
			Self::Stdout(w)   => w.write(buf),
			Self::File(w)     => w.write(buf),
			Self::Shared(w)   => w.write(buf)
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self {
			Self::Closed      => Ok(()),
			Self::Stdout(w)   => w.flush(),
			Self::File(w)     => w.flush(),
			Self::Shared(w)   => w.flush()
		}
	}
}

/// State every generator carries: the registry, the output and the active feature.
pub struct GenBase<'a> {
	pub registry: &'a Registry,
	pub out:      Sink<'a>,
	pub feature:  Option<ActiveFeature>,
	shared:       Option<&'a mut dyn io::Write>
}

impl<'a> GenBase<'a> {
	pub fn new(registry: &'a Registry) -> Self {
		Self { registry, out: Sink::Closed, feature: None, shared: None }
	}

	/// Writes to `writer` instead of opening a file in [`GenBase::open`].
	pub fn with_writer(registry: &'a Registry, writer: &'a mut dyn io::Write) -> Self {
		Self { registry, out: Sink::Closed, feature: None, shared: Some(writer) }
	}

	/// Opens `dir/filename`, `filename`, or standard output if there is no file name.
	pub fn open(&mut self, dir: Option<&Path>, filename: Option<&str>) -> Result<()> {
		self.out = match (self.shared.take(), filename) {
			(Some(w), _) => Sink::Shared(w),
			(None, Some(filename)) => {
				let path = match dir {
					Some(dir) => dir.join(filename),
					None => Path::new(filename).to_path_buf()
				};
				if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
					fs::create_dir_all(parent)?;
				}
				log::debug!("opening output file `{}`", path.display());
				Sink::File(io::BufWriter::new(fs::File::create(path)?))
			}
			(None, None) => Sink::Stdout(io::stdout())
		};
		Ok(())
	}

	/// Flushes the output and closes it, unless it is standard output or a shared writer.
	pub fn close(&mut self) -> Result<()> {
		io::Write::flush(&mut self.out)?;
		match std::mem::replace(&mut self.out, Sink::Closed) {
			Sink::Shared(w) => self.shared = Some(w),
			Sink::Stdout(w) => self.out = Sink::Stdout(w),
			_ => ()
		}
		Ok(())
	}

	pub fn begin_feature(&mut self, feature: &Feature, emit: bool) {
		self.feature = Some(ActiveFeature::new(feature, emit));
	}

	pub fn end_feature(&mut self) {
		self.feature = None;
	}

	pub fn emit(&self) -> bool {
		self.feature.as_ref().map_or(false, |f| f.emit)
	}

	pub fn feature_name(&self) -> &str {
		self.feature.as_ref().map_or("", |f| f.name.as_str())
	}

	pub fn protect(&self) -> Option<&str> {
		self.feature.as_ref().and_then(|f| f.protect.as_deref())
	}
}

/// Parses an integer literal the way C does, with an optional sign and base prefix.
pub fn parse_int(s: &str) -> Option<i64> {
	let s = s.trim();
	let (neg, s) = match s.strip_prefix('-') {
		Some(s) => (true, s),
		None => (false, s.strip_prefix('+').unwrap_or(s))
	};
	let v = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
		i64::from_str_radix(hex, 16).ok()?
	} else if let Some(oct) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
		i64::from_str_radix(oct, 8).ok()?
	} else if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
		i64::from_str_radix(bin, 2).ok()?
	} else {
		s.parse().ok()?
	};
	Some(if neg { -v } else { v })
}

/// Resolves the value of an enumerant to its number and its printable form.
///
/// An explicit value is only parsed if `needs_num` is set. Bit positions print as zero padded
/// hex literals, extension offsets as decimal numbers.
pub fn enum_to_value(e: &Enumerant, needs_num: bool) -> Result<(Option<i64>, Option<String>)> {
	let invalid = |v: &str| Error::registry(format!("invalid value `{}` of enumerant `{}`", v, e.name));

	match &e.value {
		Some(EnumValue::Value(value)) => {
			let num = match needs_num {
				true => Some(parse_int(value).ok_or_else(|| invalid(value))?),
				false => None
			};
			log::debug!("enum {} -> value [{:?}, {}]", e.name, num, value);
			Ok((num, Some(value.clone())))
		}
		Some(EnumValue::Bitpos(bitpos)) => {
			let pos = parse_int(bitpos)
				.filter(|v| (0..63).contains(v))
				.ok_or_else(|| invalid(bitpos))?;
			let num = 1i64 << pos;
			let value = format!("0x{:08x}", num);
			log::debug!("enum {} -> bitpos [{}, {}]", e.name, num, value);
			Ok((Some(num), Some(value)))
		}
		Some(EnumValue::Offset { offset, extnumber, dir }) => {
			let offset = parse_int(offset).ok_or_else(|| invalid(offset))?;
			let extnumber = parse_int(extnumber).ok_or_else(|| invalid(extnumber))?;
			let mut num = EXT_BASE + (extnumber - 1) * EXT_BLOCK_SIZE + offset;
			if dir.is_some() {
				num = -num;
			}
			log::debug!("enum {} offset = {} extnumber = {} extends = {:?} negative = {}",
				e.name, offset, extnumber, e.extends, dir.is_some());
			Ok((Some(num), Some(num.to_string())))
		}
		None => Ok((None, None))
	}
}

/// Sort key of a feature's category: core versions, then Khronos extensions, then the rest.
pub fn feature_category_key(feature: &Feature) -> u32 {
	match (feature.kind, feature.category.as_str()) {
		(FeatureKind::Feature, _) => 0,
		(_, "ARB" | "KHR" | "OES") => 1,
		_ => 2
	}
}

/// Puts features in the default generation order.
pub fn sort_features(features: &mut [&Feature]) {
	features.sort_by_key(|f| f.number);
	features.sort_by(|a, b| a.version_number()
		.partial_cmp(&b.version_number())
		.unwrap_or(Ordering::Equal));
	features.sort_by_key(|f| feature_category_key(f));
}

/// The names of the synthesized enumerants of a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupName {
	/// The group name in upper snake case.
	pub expand: String,
	pub prefix: String,
	/// A vendor suffix like `_KHR`, or empty.
	pub suffix: String
}

impl GroupName {
	pub fn new(name: &str) -> Self {
		static CAMEL: OnceLock<Regex> = OnceLock::new();
		static SUFFIX: OnceLock<Regex> = OnceLock::new();

		let camel = CAMEL.get_or_init(|| Regex::new(r"([0-9a-z_])([A-Z0-9][^A-Z0-9]?)")
			.expect("valid pattern"));
		let suffix_re = SUFFIX.get_or_init(|| Regex::new(r"[A-Z][A-Z]+$")
			.expect("valid pattern"));

		let expand = camel.replace_all(name, "${1}_${2}").to_uppercase();
		match suffix_re.find(name) {
			Some(m) => {
				let suffix = format!("_{}", m.as_str());
				let prefix = match expand.rfind(&suffix) {
					Some(i) => expand[..i].to_string(),
					None => expand.clone()
				};
				Self { expand, prefix, suffix }
			}
			None => Self { prefix: expand.clone(), expand, suffix: String::new() }
		}
	}

	/// Whether the group is an enumeration, as opposed to a set of flag bits.
	pub fn is_enum(&self) -> bool {
		!self.prefix.contains("FLAG_BITS")
	}

	pub fn constant(&self, name: &str) -> String {
		format!("{}_{}{}", self.prefix, name, self.suffix)
	}
}

/// Whether an enumerant of a group is written, extension enumerants are filtered.
pub fn enumerant_selected(e: &Enumerant, add_extensions: &Regex, default_extensions: Option<&str>) -> bool {
	match &e.extname {
		None => true,
		Some(ext) => matches_start(add_extensions, ext)
			|| (default_extensions.is_some() && default_extensions == e.supported.as_deref())
	}
}

/// The names of the smallest and largest core enumerant of a group.
pub fn enum_range(group: &Group) -> Result<Option<(String, String)>> {
	let mut range: Option<((i64, &str), (i64, &str))> = None;
	for e in group.enums.iter().filter(|e| e.extends.is_none()) {
		let num = match enum_to_value(e, true)?.0 {
			Some(num) => num,
			None => continue
		};
		let cur = (num, e.name.as_str());
		range = Some(match range {
			None => (cur, cur),
			Some((min, max)) if num < min.0 => (cur, max),
			Some((min, max)) if num > max.0 => (min, cur),
			Some(r) => r
		});
	}
	Ok(range.map(|((_, min), (_, max))| (min.to_string(), max.to_string())))
}

/// Whether `re` matches at the start of `s`.
pub fn matches_start(re: &Regex, s: &str) -> bool {
	re.find(s).map_or(false, |m| m.start() == 0)
}

/// The include guard symbol of a header, `vulkan.h` becomes `vulkan_h_`.
pub fn header_symbol(basename: &str) -> String {
	basename.replace(".h", "_h_")
}

/// Blocks of text of the current feature, written in a fixed order when the feature ends.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Section {
	Include,
	Define,
	Basetype,
	Handle,
	Enum,
	Group,
	Bitmask,
	Funcpointer,
	Struct,
	CommandPointer,
	Command
}

impl Section {
	pub const TYPES: [Self; 9] = [
		Self::Include,
		Self::Define,
		Self::Basetype,
		Self::Handle,
		Self::Enum,
		Self::Group,
		Self::Bitmask,
		Self::Funcpointer,
		Self::Struct
	];

	pub fn of(category: TypeCategory) -> Self {
		match category {
			TypeCategory::Include     => Self::Include,
			TypeCategory::Define      => Self::Define,
			TypeCategory::Basetype    => Self::Basetype,
			TypeCategory::Handle      => Self::Handle,
			TypeCategory::Enum        => Self::Enum,
			TypeCategory::Bitmask     => Self::Bitmask,
			TypeCategory::Funcpointer => Self::Funcpointer,
			TypeCategory::Struct | TypeCategory::Union => Self::Struct
		}
	}
}

/// The output accumulated for one feature.
#[derive(Clone, Debug, Default)]
pub struct Sections {
	map: BTreeMap<Section, Vec<String>>
}

impl Sections {
	pub fn push(&mut self, section: Section, text: impl Into<String>) {
		self.map.entry(section).or_default().push(text.into());
	}

	pub fn get(&self, section: Section) -> &[String] {
		self.map.get(&section).map_or(&[], Vec::as_slice)
	}

	/// Writes all type sections in order, each followed by an empty line.
	pub fn write_types(&self, writer: &mut impl io::Write) -> io::Result<()> {
		for section in Section::TYPES {
			let contents = self.get(section);
			if !contents.is_empty() {
				writeln!(writer, "{}", contents.join("\n"))?;
				writeln!(writer)?;
			}
		}
		Ok(())
	}
}

/// The text of a non-aggregate type, with `<apientry/>` replaced.
pub fn type_text(ty: &TypeInfo, apientry: &str) -> String {
	ty.decl.nodes.iter().fold(ty.decl.text.clone(), |mut s, n| {
		match n.tag.as_str() {
			"apientry" => s.push_str(apientry),
			_ => s.push_str(&n.text)
		}
		s.push_str(&n.tail);
		s
	})
}
