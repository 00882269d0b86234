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

//! Generator options, one record per back end composed of the shared parts below.

use {
	crate::error::Result,
	regex::Regex,
	serde::Deserialize,
	std::{fmt, path::PathBuf}
};

/// A pattern that never matches, used for absent or empty filters.
const NO_MATCH: &str = "_nomatch_^";

/// Filters deciding which features are generated, shared by all back ends.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CommonOptions {
	/// The output file, relative to the output directory. Standard output if absent.
	pub filename:           Option<String>,
	pub apiname:            Option<String>,
	pub profile:            Option<String>,
	/// Core versions to traverse.
	pub versions:           Option<String>,
	/// Core versions to actually write output for.
	pub emitversions:       Option<String>,
	/// Extensions whose `supported` attribute matches are included.
	pub default_extensions: Option<String>,
	pub add_extensions:     Option<String>,
	pub remove_extensions:  Option<String>,
	/// Whether features are put in the default order before traversal.
	pub sort:               bool
}

impl Default for CommonOptions {
	fn default() -> Self {
		Self {
			filename:           None,
			apiname:            None,
			profile:            None,
			versions:           Some(".*".to_string()),
			emitversions:       Some(".*".to_string()),
			default_extensions: None,
			add_extensions:     None,
			remove_extensions:  None,
			sort:               true
		}
	}
}

impl CommonOptions {
	pub fn new(filename: impl Into<String>, apiname: impl Into<String>) -> Self {
		Self {
			filename: Some(filename.into()),
			apiname:  Some(apiname.into()),
			..Self::default()
		}
	}

	/// Compiles a filter, an empty or absent pattern never matches.
	pub fn pattern(pat: Option<&str>) -> Result<Regex> {
		Ok(Regex::new(match pat {
			Some(pat) if !pat.is_empty() => pat,
			_ => NO_MATCH
		})?)
	}

	/// The base name of the output file, without directories.
	pub fn basename(&self) -> Option<&str> {
		self.filename.as_deref()
			.map(|f| f.rsplit(['/', '\\']).next().unwrap_or(f))
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
pub enum ProtectProto {
	#[serde(rename = "#ifdef")]
	Ifdef,
	#[serde(rename = "#ifndef")]
	Ifndef
}

impl fmt::Display for ProtectProto {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Ifdef  => "#ifdef",
			Self::Ifndef => "#ifndef"
		})
	}
}

/// Knobs for C style declarations.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CDeclOptions {
	/// Lines written right after the file header.
	pub prefix_text:         Vec<String>,
	pub gen_func_pointers:   bool,
	/// Wrap the whole file in an include guard.
	pub protect_file:        bool,
	/// Wrap each feature in an `#ifndef <feature>` block.
	pub protect_feature:     bool,
	pub protect_proto:       Option<ProtectProto>,
	pub protect_proto_str:   Option<String>,
	pub apicall:             String,
	pub apientry:            String,
	pub apientryp:           String,
	pub indent_func_proto:   bool,
	pub indent_func_pointer: bool,
	/// Column parameter names of prototypes are aligned to, 0 to disable.
	pub align_func_param:    usize
}

impl Default for CDeclOptions {
	fn default() -> Self {
		Self {
			prefix_text:         Vec::new(),
			gen_func_pointers:   true,
			protect_file:        true,
			protect_feature:     true,
			protect_proto:       None,
			protect_proto_str:   None,
			apicall:             String::new(),
			apientry:            String::new(),
			apientryp:           String::new(),
			indent_func_proto:   true,
			indent_func_pointer: false,
			align_func_param:    0
		}
	}
}

/// Where per-construct files are written.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DirOptions {
	pub gen_directory: Option<PathBuf>
}

impl DirOptions {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { gen_directory: Some(dir.into()) }
	}

	/// The output directory, the working directory if absent.
	pub fn dir(&self) -> PathBuf {
		self.gen_directory.clone().unwrap_or_else(|| PathBuf::from("."))
	}
}

fn default_true() -> bool {
	true
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CGeneratorOptions {
	#[serde(flatten)]
	pub common: CommonOptions,
	#[serde(flatten)]
	pub decl:   CDeclOptions
}

#[derive(Clone, Debug, Deserialize)]
pub struct DocGeneratorOptions {
	#[serde(flatten)]
	pub common:            CommonOptions,
	#[serde(flatten)]
	pub decl:              CDeclOptions,
	#[serde(flatten)]
	pub dir:               DirOptions,
	/// Append the range and padding enumerants to enum groups.
	#[serde(default = "default_true")]
	pub expand_enumerants: bool
}

impl Default for DocGeneratorOptions {
	fn default() -> Self {
		Self {
			common:            CommonOptions::default(),
			decl:              CDeclOptions::default(),
			dir:               DirOptions::default(),
			expand_enumerants: true
		}
	}
}

impl DocGeneratorOptions {
	/// The output directory, `gen` if absent.
	pub fn gen_directory(&self) -> PathBuf {
		self.dir.gen_directory.clone().unwrap_or_else(|| PathBuf::from("gen"))
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PyGeneratorOptions {
	#[serde(flatten)]
	pub common: CommonOptions
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ValidityGeneratorOptions {
	#[serde(flatten)]
	pub common: CommonOptions,
	#[serde(flatten)]
	pub dir:    DirOptions
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HostSyncGeneratorOptions {
	#[serde(flatten)]
	pub common: CommonOptions,
	#[serde(flatten)]
	pub dir:    DirOptions
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ThreadGeneratorOptions {
	#[serde(flatten)]
	pub common: CommonOptions,
	#[serde(flatten)]
	pub decl:   CDeclOptions,
	#[serde(flatten)]
	pub dir:    DirOptions
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ParamCheckerGeneratorOptions {
	#[serde(flatten)]
	pub common: CommonOptions,
	#[serde(flatten)]
	pub decl:   CDeclOptions,
	#[serde(flatten)]
	pub dir:    DirOptions
}

/// Any of the option records, tagged by the `generator` field when read from a file.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "generator", rename_all = "lowercase")]
pub enum GeneratorOptions {
	C(CGeneratorOptions),
	Doc(DocGeneratorOptions),
	Py(PyGeneratorOptions),
	Validity(ValidityGeneratorOptions),
	HostSync(HostSyncGeneratorOptions),
	Thread(ThreadGeneratorOptions),
	ParamChecker(ParamCheckerGeneratorOptions)
}

impl GeneratorOptions {
	pub fn from_json(reader: impl std::io::Read) -> Result<Self> {
		Ok(serde_json::from_reader(reader)?)
	}

	/// The default options of the generator called `name`.
	pub fn by_name(name: &str) -> Option<Self> {
		Some(match name {
			"c"            => Self::C(CGeneratorOptions::default()),
			"doc"          => Self::Doc(DocGeneratorOptions::default()),
			"py"           => Self::Py(PyGeneratorOptions::default()),
			"validity"     => Self::Validity(ValidityGeneratorOptions::default()),
			"hostsync"     => Self::HostSync(HostSyncGeneratorOptions::default()),
			"thread"       => Self::Thread(ThreadGeneratorOptions::default()),
			"paramchecker" => Self::ParamChecker(ParamCheckerGeneratorOptions::default()),
			_ => return None
		})
	}

	pub fn common(&self) -> &CommonOptions {
		match self {
			Self::C(o)            => &o.common,
			Self::Doc(o)          => &o.common,
			Self::Py(o)           => &o.common,
			Self::Validity(o)     => &o.common,
			Self::HostSync(o)     => &o.common,
			Self::Thread(o)       => &o.common,
			Self::ParamChecker(o) => &o.common
		}
	}

	pub fn common_mut(&mut self) -> &mut CommonOptions {
		match self {
			Self::C(o)            => &mut o.common,
			Self::Doc(o)          => &mut o.common,
			Self::Py(o)           => &mut o.common,
			Self::Validity(o)     => &mut o.common,
			Self::HostSync(o)     => &mut o.common,
			Self::Thread(o)       => &mut o.common,
			Self::ParamChecker(o) => &mut o.common
		}
	}

	pub fn dir_mut(&mut self) -> Option<&mut DirOptions> {
		match self {
			Self::Doc(o)          => Some(&mut o.dir),
			Self::Validity(o)     => Some(&mut o.dir),
			Self::HostSync(o)     => Some(&mut o.dir),
			Self::Thread(o)       => Some(&mut o.dir),
			Self::ParamChecker(o) => Some(&mut o.dir),
			Self::C(_) | Self::Py(_) => None
		}
	}
}
