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

//! C header generator.

use {
	super::{*, decl::*},
	crate::options::{CommonOptions, CGeneratorOptions},
	std::io::Write
};

pub struct COutputGenerator<'a> {
	base:           GenBase<'a>,
	opts:           CGeneratorOptions,
	add_extensions: Regex,
	sections:       Sections
}

impl<'a> COutputGenerator<'a> {
	pub fn new(registry: &'a Registry, opts: CGeneratorOptions) -> Result<Self> {
		Self::with_base(GenBase::new(registry), opts)
	}

	pub fn with_writer(registry: &'a Registry, opts: CGeneratorOptions, writer: &'a mut dyn io::Write) -> Result<Self> {
		Self::with_base(GenBase::with_writer(registry, writer), opts)
	}

	fn with_base(base: GenBase<'a>, opts: CGeneratorOptions) -> Result<Self> {
		Ok(Self {
			add_extensions: CommonOptions::pattern(opts.common.add_extensions.as_deref())?,
			base,
			opts,
			sections:       Sections::default()
		})
	}

	fn protected_file(&self) -> Option<String> {
		match self.opts.decl.protect_file {
			true => self.opts.common.basename().map(|f| header_symbol(f).to_uppercase()),
			false => None
		}
	}
}

impl OutputGenerator for COutputGenerator<'_> {
	fn active_feature(&self) -> Option<&ActiveFeature> {
		self.base.feature.as_ref()
	}

	fn begin_file(&mut self) -> Result<()> {
		self.base.open(None, self.opts.common.filename.as_deref())?;
		let protected = self.protected_file();
		let out = &mut self.base.out;

		if let Some(sym) = protected {
			writeln!(out, "#ifndef {}", sym)?;
			writeln!(out, "#define {} 1", sym)?;
			writeln!(out)?;
		}

		writeln!(out, "#ifdef __cplusplus")?;
		writeln!(out, "extern \"C\" {{")?;
		writeln!(out, "#endif")?;
		writeln!(out)?;

		for line in &self.opts.decl.prefix_text {
			writeln!(out, "{}", line)?;
		}
		Ok(())
	}

	fn end_file(&mut self) -> Result<()> {
		let protected = self.protected_file().is_some();
		let out = &mut self.base.out;

		writeln!(out)?;
		writeln!(out, "#ifdef __cplusplus")?;
		writeln!(out, "}}")?;
		writeln!(out, "#endif")?;
		if protected {
			writeln!(out)?;
			writeln!(out, "#endif")?;
		}
		self.base.close()
	}

	fn begin_feature(&mut self, feature: &Feature, emit: bool) -> Result<()> {
		self.base.begin_feature(feature, emit);
		self.sections = Sections::default();
		Ok(())
	}

	fn end_feature(&mut self) -> Result<()> {
		let sections = std::mem::take(&mut self.sections);

		if self.base.emit() {
			let decl = &self.opts.decl;
			let name = self.base.feature_name().to_string();
			let protect = self.base.protect().map(String::from);
			let out = &mut self.base.out;

			writeln!(out)?;
			if decl.protect_feature {
				writeln!(out, "#ifndef {}", name)?;
			}
			if let Some(protect) = &protect {
				writeln!(out, "#ifdef {}", protect)?;
			}
			writeln!(out, "#define {} 1", name)?;

			sections.write_types(out)?;

			let pointers = sections.get(Section::CommandPointer);
			if decl.gen_func_pointers && !pointers.is_empty() {
				writeln!(out, "{}", pointers.join("\n"))?;
				writeln!(out)?;
			}

			let commands = sections.get(Section::Command);
			if !commands.is_empty() {
				if let Some(pp) = decl.protect_proto {
					writeln!(out, "{} {}", pp, decl.protect_proto_str.as_deref().unwrap_or_default())?;
				}
				write!(out, "{}", commands.join("\n"))?;
				match decl.protect_proto {
					Some(_) => writeln!(out, "#endif")?,
					None => writeln!(out)?
				}
			}

			if let Some(protect) = &protect {
				writeln!(out, "#endif /* {} */", protect)?;
			}
			if decl.protect_feature {
				writeln!(out, "#endif /* {} */", name)?;
			}
		}

		self.base.end_feature();
		Ok(())
	}

	fn gen_type(&mut self, ty: &TypeInfo) -> Result<()> {
		let category = match ty.category {
			Some(c) if c.is_aggregate() => return self.gen_struct(ty),
			c => c
		};

		let mut s = type_text(ty, &self.opts.decl.apientry);
		if s.is_empty() {
			return Ok(());
		}
		if s.contains('\n') {
			s.push('\n');
		}

		match category {
			Some(category) => self.sections.push(Section::of(category), s),
			None => log::debug!("dropping type `{}` without category", ty.name)
		}
		Ok(())
	}

	fn gen_struct(&mut self, ty: &TypeInfo) -> Result<()> {
		let category = ty.category.unwrap_or(TypeCategory::Struct);
		let mut body = make_struct_body(category, &ty.name, &ty.members);
		body.push('\n');
		self.sections.push(Section::Struct, body);
		Ok(())
	}

	fn gen_group(&mut self, group: &Group) -> Result<()> {
		let name = GroupName::new(&group.name);
		let mut body = format!("\ntypedef enum {} {{\n", group.name);

		for e in &group.enums {
			let (_, value) = enum_to_value(e, true)?;
			if enumerant_selected(e, &self.add_extensions, self.opts.common.default_extensions.as_deref()) {
				body.push_str(&format!("    {} = {},\n", e.name, value.unwrap_or_default()));
			}
		}

		if name.is_enum() {
			match enum_range(group)? {
				Some((min, max)) => {
					body.push_str(&format!("    {} = {},\n", name.constant("BEGIN_RANGE"), min));
					body.push_str(&format!("    {} = {},\n", name.constant("END_RANGE"), max));
					body.push_str(&format!("    {} = ({} - {} + 1),\n", name.constant("RANGE_SIZE"), max, min));
				}
				None => log::warn!("enum group `{}` has no core enumerants, no range generated", group.name)
			}
		}

		body.push_str(&format!("    {} = 0x7FFFFFFF\n", name.constant("MAX_ENUM")));
		body.push_str(&format!("}} {};", group.name));

		self.sections.push(if group.bitmask { Section::Bitmask } else { Section::Group }, body);
		Ok(())
	}

	fn gen_enum(&mut self, e: &Enumerant) -> Result<()> {
		let (_, value) = enum_to_value(e, false)?;
		self.sections.push(Section::Enum, format!("#define {:<33} {}", e.name, value.unwrap_or_default()));
		Ok(())
	}

	fn gen_cmd(&mut self, cmd: &CommandInfo) -> Result<()> {
		let decls = make_c_decls(&self.opts.decl, cmd);
		self.sections.push(Section::Command, decls.proto + "\n");
		if self.opts.decl.gen_func_pointers {
			self.sections.push(Section::CommandPointer, decls.pointer);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq, crate::options::*};

	const REGISTRY: &str = r#"<registry>
	<types>
		<type category="define">#define <name>VK_VERSION_MAJOR</name>(version) ((uint32_t)(version) &gt;&gt; 22)</type>
		<type category="basetype">typedef <type>uint32_t</type> <name>VkFlags</name>;</type>
		<type category="handle"><type>VK_DEFINE_HANDLE</type>(<name>VkDevice</name>)</type>
		<type category="funcpointer">typedef void (VKAPI_PTR *<name>PFN_vkVoidFunction</name>)(void);</type>
		<type category="struct" name="VkOffset2D">
			<member><type>int32_t</type> <name>x</name></member>
			<member><type>int32_t</type> <name>y</name></member>
		</type>
	</types>
	<enums name="VkImageType" type="enum">
		<enum value="0" name="VK_IMAGE_TYPE_1D"/>
		<enum value="1" name="VK_IMAGE_TYPE_2D"/>
	</enums>
	<enums name="VkCullModeFlagBits" type="bitmask">
		<enum bitpos="0" name="VK_CULL_MODE_FRONT_BIT"/>
	</enums>
	<commands>
		<command>
			<proto><type>void</type> <name>vkDeviceWaitIdle</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
		</command>
	</commands>
</registry>"#;

	fn generate(opts: CGeneratorOptions) -> String {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let feature = Feature { name: "VK_VERSION_1_0".to_string(), ..Feature::default() };
		let mut buf = Vec::new();
		{
			let mut gen = COutputGenerator::with_writer(&reg, opts, &mut buf).unwrap();
			gen.begin_file().unwrap();
			gen.begin_feature(&feature, true).unwrap();
			for ty in ["VK_VERSION_MAJOR", "VkFlags", "VkDevice", "PFN_vkVoidFunction", "VkOffset2D"] {
				gen.generate(Construct::Type(&reg.types[ty])).unwrap();
			}
			gen.generate(Construct::Group(&reg.groups["VkImageType"])).unwrap();
			gen.generate(Construct::Group(&reg.groups["VkCullModeFlagBits"])).unwrap();
			gen.generate(Construct::Enum(&Enumerant {
				name:  "VK_MAX_EXTENSION_NAME_SIZE".to_string(),
				value: Some(EnumValue::Value("256".to_string())),
				..Enumerant::default()
			})).unwrap();
			gen.generate(Construct::Command(&reg.commands["vkDeviceWaitIdle"])).unwrap();
			gen.end_feature().unwrap();
			gen.end_file().unwrap();
		}
		String::from_utf8(buf).unwrap()
	}

	#[test]
	fn header() {
		let out = generate(CGeneratorOptions {
			common: CommonOptions::new("include/vulkan.h", "vulkan"),
			decl:   CDeclOptions {
				prefix_text:       vec!["/* prefix */".to_string()],
				apientryp:         "VKAPI_PTR *".to_string(),
				protect_proto:     Some(ProtectProto::Ifndef),
				protect_proto_str: Some("VK_NO_PROTOTYPES".to_string()),
				..CDeclOptions::default()
			}
		});

		assert_eq!(out, r#"#ifndef VULKAN_H_
#define VULKAN_H_ 1

#ifdef __cplusplus
extern "C" {
#endif

/* prefix */

#ifndef VK_VERSION_1_0
#define VK_VERSION_1_0 1
#define VK_VERSION_MAJOR(version) ((uint32_t)(version) >> 22)

typedef uint32_t VkFlags;

VK_DEFINE_HANDLE(VkDevice)

#define VK_MAX_EXTENSION_NAME_SIZE        256


typedef enum VkImageType {
    VK_IMAGE_TYPE_1D = 0,
    VK_IMAGE_TYPE_2D = 1,
    VK_IMAGE_TYPE_BEGIN_RANGE = VK_IMAGE_TYPE_1D,
    VK_IMAGE_TYPE_END_RANGE = VK_IMAGE_TYPE_2D,
    VK_IMAGE_TYPE_RANGE_SIZE = (VK_IMAGE_TYPE_2D - VK_IMAGE_TYPE_1D + 1),
    VK_IMAGE_TYPE_MAX_ENUM = 0x7FFFFFFF
} VkImageType;


typedef enum VkCullModeFlagBits {
    VK_CULL_MODE_FRONT_BIT = 0x00000001,
    VK_CULL_MODE_FLAG_BITS_MAX_ENUM = 0x7FFFFFFF
} VkCullModeFlagBits;

typedef void (VKAPI_PTR *PFN_vkVoidFunction)(void);

typedef struct VkOffset2D {
    int32_t    x;
    int32_t    y;
} VkOffset2D;


typedef void (VKAPI_PTR *PFN_vkDeviceWaitIdle)(VkDevice device);

#ifndef VK_NO_PROTOTYPES
void vkDeviceWaitIdle(
    VkDevice device);
#endif
#endif /* VK_VERSION_1_0 */

#ifdef __cplusplus
}
#endif

#endif
"#);
	}

	#[test]
	fn skipped_feature_writes_nothing() {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut buf = Vec::new();
		{
			let opts = CGeneratorOptions {
				decl: CDeclOptions { protect_file: false, ..CDeclOptions::default() },
				..CGeneratorOptions::default()
			};
			let mut gen = COutputGenerator::with_writer(&reg, opts, &mut buf).unwrap();
			gen.begin_file().unwrap();
			gen.begin_feature(&Feature { name: "VK_VERSION_1_1".to_string(), ..Feature::default() }, false).unwrap();
			gen.generate(Construct::Command(&reg.commands["vkDeviceWaitIdle"])).unwrap();
			gen.end_feature().unwrap();
			gen.end_file().unwrap();
		}
		assert_eq!(String::from_utf8(buf).unwrap(), "#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n\n#ifdef __cplusplus\n}\n#endif\n");
	}
}
