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

//! Generates C headers, documentation includes, validity text and validation layer sources from
//! the Vulkan API registry, to be used in build scripts or through the `vkregen` binary.
//!
//! Example:
//! ```rust
//! use {vkregen::*, std::{fs, io}};
//!
//! fn main() {
//! 	let registry = Registry::from_xml(fs::File::open("vk.xml")
//! 		.map(io::BufReader::new)
//! 		.expect("failed to open input file"))
//! 		.expect("failed to parse registry");
//!
//! 	generate(&registry, &GeneratorOptions::C(CGeneratorOptions {
//! 		common: CommonOptions::new("vulkan.h", "vulkan"),
//! 		..CGeneratorOptions::default()
//! 	})).expect("failed to write the generated code");
//! }
//! ```

pub use {
	parse::*,
	gen::*,
	options::*,
	error::{Error, Result},
	driver::{api_gen, select_features}
};

pub mod error;
pub mod xml;
pub mod parse;
pub mod options;
pub mod gen;
pub mod driver;

/// Runs the generator selected by `options` over `registry`, writing to the files named by
/// the options.
pub fn generate(registry: &Registry, options: &GeneratorOptions) -> Result<()> {
	let common = options.common();
	match options.clone() {
		GeneratorOptions::C(o)            => api_gen(registry, &mut COutputGenerator::new(registry, o)?, common),
		GeneratorOptions::Doc(o)          => api_gen(registry, &mut DocOutputGenerator::new(registry, o)?, common),
		GeneratorOptions::Py(o)           => api_gen(registry, &mut PyOutputGenerator::new(registry, o), common),
		GeneratorOptions::Validity(o)     => api_gen(registry, &mut ValidityOutputGenerator::new(registry, o), common),
		GeneratorOptions::HostSync(o)     => api_gen(registry, &mut HostSyncOutputGenerator::new(registry, o), common),
		GeneratorOptions::Thread(o)       => api_gen(registry, &mut ThreadOutputGenerator::new(registry, o), common),
		GeneratorOptions::ParamChecker(o) => api_gen(registry, &mut ParamCheckerOutputGenerator::new(registry, o)?, common)
	}
}

/// Like [`generate`], but single file generators write to `writer` instead.
///
/// Generators writing one file per construct ignore `writer`.
pub fn generate_to(registry: &Registry, options: &GeneratorOptions, writer: &mut dyn std::io::Write) -> Result<()> {
	let common = options.common();
	match options.clone() {
		GeneratorOptions::C(o)            => api_gen(registry, &mut COutputGenerator::with_writer(registry, o, writer)?, common),
		GeneratorOptions::Py(o)           => api_gen(registry, &mut PyOutputGenerator::with_writer(registry, o, writer), common),
		GeneratorOptions::Thread(o)       => api_gen(registry, &mut ThreadOutputGenerator::with_writer(registry, o, writer), common),
		GeneratorOptions::ParamChecker(o) => api_gen(registry, &mut ParamCheckerOutputGenerator::with_writer(registry, o, writer)?, common),
		options => generate(registry, &options)
	}
}
