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

//! Documentation includes, one file per construct.

use {
	super::{*, decl::*, validity::BANNER},
	crate::options::{CommonOptions, DocGeneratorOptions},
	std::{io::Write, path::PathBuf}
};

const RULE: &str = "------------------------------------------------------------------------------";

pub struct DocOutputGenerator<'a> {
	base:           GenBase<'a>,
	opts:           DocGeneratorOptions,
	add_extensions: Regex
}

impl<'a> DocOutputGenerator<'a> {
	pub fn new(registry: &'a Registry, opts: DocGeneratorOptions) -> Result<Self> {
		Ok(Self {
			add_extensions: CommonOptions::pattern(opts.common.add_extensions.as_deref())?,
			base:           GenBase::new(registry),
			opts
		})
	}

	/// Writes `<gen_directory>/<dir>/<name>.txt`, unless the feature is not emitted.
	fn write_include(&self, dir: &str, name: &str, contents: &str) -> Result<PathBuf> {
		let path = self.opts.gen_directory().join(dir).join(format!("{}.txt", name));
		if !self.base.emit() {
			log::debug!("skipping include file `{}` of feature `{}`", path.display(), self.base.feature_name());
			return Ok(path);
		}

		log::debug!("generating include file `{}`", path.display());
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}

		let mut file = io::BufWriter::new(fs::File::create(&path)?);
		writeln!(file, "{}", BANNER)?;
		writeln!(file, "ifndef::doctype-manpage[]")?;
		writeln!(file, "[[{0},{0}]]", name)?;
		writeln!(file, "[\"source\",\"{{basebackend@docbook:c++:cpp}}\",title=\"\"]")?;
		writeln!(file, "endif::doctype-manpage[]")?;
		writeln!(file, "ifdef::doctype-manpage[]")?;
		writeln!(file, "[\"source\",\"{{basebackend@docbook:c++:cpp}}\"]")?;
		writeln!(file, "endif::doctype-manpage[]")?;
		writeln!(file, "{}", RULE)?;
		writeln!(file, "{}", contents)?;
		writeln!(file, "{}", RULE)?;
		file.flush()?;
		Ok(path)
	}
}

impl OutputGenerator for DocOutputGenerator<'_> {
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
		if ty.category.map_or(false, TypeCategory::is_aggregate) {
			return self.gen_struct(ty);
		}

		let s = type_text(ty, &self.opts.decl.apientry);
		if s.is_empty() {
			log::debug!("not writing empty include file for type `{}`", ty.name);
			return Ok(());
		}

		let dir = match ty.category {
			Some(TypeCategory::Bitmask)     => "flags",
			Some(TypeCategory::Enum)        => "enums",
			Some(TypeCategory::Funcpointer) => "funcpointers",
			category => {
				log::debug!("not writing include file for type `{}` category: {:?}", ty.name, category);
				return Ok(());
			}
		};
		self.write_include(dir, &ty.name, &(s + "\n"))?;
		Ok(())
	}

	fn gen_struct(&mut self, ty: &TypeInfo) -> Result<()> {
		let category = ty.category.unwrap_or(TypeCategory::Struct);
		self.write_include("structs", &ty.name, &make_struct_body(category, &ty.name, &ty.members))?;
		Ok(())
	}

	fn gen_group(&mut self, group: &Group) -> Result<()> {
		let expand = self.opts.expand_enumerants;
		let name = GroupName::new(&group.name);
		let mut s = format!("typedef enum {} {{\n", group.name);

		for e in &group.enums {
			let (_, value) = enum_to_value(e, true)?;
			if enumerant_selected(e, &self.add_extensions, self.opts.common.default_extensions.as_deref()) {
				s.push_str(&format!("    {} = {},\n", e.name, value.unwrap_or_default()));
			}
		}

		if expand {
			s.push('\n');
			if name.is_enum() {
				match enum_range(group)? {
					Some((min, max)) => {
						s.push_str(&format!("    {} = {},\n", name.constant("BEGIN_RANGE"), min));
						s.push_str(&format!("    {} = {},\n", name.constant("END_RANGE"), max));
						s.push_str(&format!("    {} = ({} - {} + 1),\n", name.constant("RANGE_SIZE"), max, min));
					}
					None => log::warn!("enum group `{}` has no core enumerants, no range generated", group.name)
				}
			}
			s.push_str(&format!("    {} = 0x7FFFFFFF\n", name.constant("MAX_ENUM")));
		}

		s.push_str(&format!("}} {};", group.name));
		self.write_include("enums", &group.name, &s)?;
		Ok(())
	}

	fn gen_enum(&mut self, e: &Enumerant) -> Result<()> {
		log::debug!("not writing compile-time constant `{}`", e.name);
		Ok(())
	}

	fn gen_cmd(&mut self, cmd: &CommandInfo) -> Result<()> {
		let decls = make_c_decls(&self.opts.decl, cmd);
		self.write_include("protos", &cmd.name, &decls.proto)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq, crate::options::*};

	const REGISTRY: &str = r#"<registry>
	<types>
		<type requires="VkCullModeFlagBits" category="bitmask">typedef <type>VkFlags</type> <name>VkCullModeFlags</name>;</type>
		<type category="handle"><type>VK_DEFINE_HANDLE</type>(<name>VkDevice</name>)</type>
		<type category="struct" name="VkOffset2D">
			<member><type>int32_t</type> <name>x</name></member>
		</type>
	</types>
	<enums name="VkColorSpaceKHR" type="enum">
		<enum value="0" name="VK_COLORSPACE_SRGB_NONLINEAR_KHR"/>
	</enums>
	<commands>
		<command>
			<proto><type>void</type> <name>vkDeviceWaitIdle</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
		</command>
	</commands>
</registry>"#;

	fn header(name: &str) -> String {
		format!("// WARNING: DO NOT MODIFY! This file is automatically generated from the vk.xml registry
ifndef::doctype-manpage[]
[[{0},{0}]]
[\"source\",\"{{basebackend@docbook:c++:cpp}}\",title=\"\"]
endif::doctype-manpage[]
ifdef::doctype-manpage[]
[\"source\",\"{{basebackend@docbook:c++:cpp}}\"]
endif::doctype-manpage[]
{1}
", name, RULE)
	}

	#[test]
	fn includes() {
		let dir = tempfile::tempdir().unwrap();
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = DocOutputGenerator::new(&reg, DocGeneratorOptions {
			dir: DirOptions::new(dir.path()),
			..DocGeneratorOptions::default()
		}).unwrap();

		gen.begin_file().unwrap();
		gen.begin_feature(&Feature { name: "VK_VERSION_1_0".to_string(), ..Feature::default() }, true).unwrap();
		for ty in ["VkCullModeFlags", "VkDevice", "VkOffset2D"] {
			gen.generate(Construct::Type(&reg.types[ty])).unwrap();
		}
		gen.generate(Construct::Group(&reg.groups["VkColorSpaceKHR"])).unwrap();
		gen.generate(Construct::Command(&reg.commands["vkDeviceWaitIdle"])).unwrap();
		gen.end_feature().unwrap();
		gen.end_file().unwrap();

		let read = |path: &str| std::fs::read_to_string(dir.path().join(path)).unwrap();

		assert_eq!(read("flags/VkCullModeFlags.txt"),
			header("VkCullModeFlags") + "typedef VkFlags VkCullModeFlags;\n\n" + RULE + "\n");
		assert_eq!(read("structs/VkOffset2D.txt"),
			header("VkOffset2D") + "typedef struct VkOffset2D {\n    int32_t    x;\n} VkOffset2D;\n" + RULE + "\n");
		assert_eq!(read("enums/VkColorSpaceKHR.txt"), header("VkColorSpaceKHR") + "\
typedef enum VkColorSpaceKHR {
    VK_COLORSPACE_SRGB_NONLINEAR_KHR = 0,

    VK_COLOR_SPACE_BEGIN_RANGE_KHR = VK_COLORSPACE_SRGB_NONLINEAR_KHR,
    VK_COLOR_SPACE_END_RANGE_KHR = VK_COLORSPACE_SRGB_NONLINEAR_KHR,
    VK_COLOR_SPACE_RANGE_SIZE_KHR = (VK_COLORSPACE_SRGB_NONLINEAR_KHR - VK_COLORSPACE_SRGB_NONLINEAR_KHR + 1),
    VK_COLOR_SPACE_MAX_ENUM_KHR = 0x7FFFFFFF
} VkColorSpaceKHR;
" + RULE + "\n");
		assert_eq!(read("protos/vkDeviceWaitIdle.txt"),
			header("vkDeviceWaitIdle") + "void vkDeviceWaitIdle(\n    VkDevice device);\n" + RULE + "\n");
		assert!(!dir.path().join("handles").exists());
	}

	#[test]
	fn unexpanded_group() {
		let dir = tempfile::tempdir().unwrap();
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = DocOutputGenerator::new(&reg, DocGeneratorOptions {
			dir:               DirOptions::new(dir.path()),
			expand_enumerants: false,
			..DocGeneratorOptions::default()
		}).unwrap();

		gen.begin_feature(&Feature::default(), true).unwrap();
		gen.generate(Construct::Group(&reg.groups["VkColorSpaceKHR"])).unwrap();
		gen.end_feature().unwrap();

		let s = std::fs::read_to_string(dir.path().join("enums/VkColorSpaceKHR.txt")).unwrap();
		assert!(s.contains("typedef enum VkColorSpaceKHR {\n    VK_COLORSPACE_SRGB_NONLINEAR_KHR = 0,\n} VkColorSpaceKHR;\n"));
	}

	#[test]
	fn skipped_feature_writes_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = DocOutputGenerator::new(&reg, DocGeneratorOptions {
			dir: DirOptions::new(dir.path()),
			..DocGeneratorOptions::default()
		}).unwrap();

		gen.begin_feature(&Feature::default(), false).unwrap();
		gen.generate(Construct::Command(&reg.commands["vkDeviceWaitIdle"])).unwrap();
		gen.end_feature().unwrap();
		assert!(!dir.path().join("protos").exists());
	}
}
