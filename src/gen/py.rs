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

//! An index of API names as Python dictionaries.

use {
	super::*,
	crate::options::PyGeneratorOptions,
	std::{fmt, io::Write}
};

const DICTS: [&str; 8] = ["flags", "enums", "structs", "consts", "enums", "consts", "protos", "funcpointers"];

/// A value of the index, printed as a Python literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PyValue {
	None,
	Str(String),
	List(Vec<String>)
}

impl PyValue {
	fn quoted(s: Option<&str>) -> Self {
		match s {
			Some(s) if !s.is_empty() => Self::Str(s.to_string()),
			_ => Self::None
		}
	}
}

impl fmt::Display for PyValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::None => f.write_str("None"),
			Self::Str(s) => write!(f, "'{}'", s),
			Self::List(list) => {
				f.write_str("[")?;
				for (i, s) in list.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "'{}'", s)?;
				}
				f.write_str("]")
			}
		}
	}
}

pub struct PyOutputGenerator<'a> {
	base: GenBase<'a>,
	opts: PyGeneratorOptions
}

impl<'a> PyOutputGenerator<'a> {
	pub fn new(registry: &'a Registry, opts: PyGeneratorOptions) -> Self {
		Self { base: GenBase::new(registry), opts }
	}

	pub fn with_writer(registry: &'a Registry, opts: PyGeneratorOptions, writer: &'a mut dyn io::Write) -> Self {
		Self { base: GenBase::with_writer(registry, writer), opts }
	}

	fn add_name(&mut self, dict: &str, name: &str, value: PyValue) -> Result<()> {
		if self.base.emit() {
			writeln!(self.base.out, "{}['{}'] =  {}", dict, name, value)?;
		}
		Ok(())
	}

	fn comment(&mut self, text: fmt::Arguments) -> Result<()> {
		if self.base.emit() {
			writeln!(self.base.out, "# {}", text)?;
		}
		Ok(())
	}
}

impl OutputGenerator for PyOutputGenerator<'_> {
	fn active_feature(&self) -> Option<&ActiveFeature> {
		self.base.feature.as_ref()
	}

	fn begin_file(&mut self) -> Result<()> {
		self.base.open(None, self.opts.common.filename.as_deref())?;
		for dict in DICTS {
			writeln!(self.base.out, "{} = {{}}", dict)?;
		}
		Ok(())
	}

	fn end_file(&mut self) -> Result<()> {
		self.base.close()
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

		if ty.decl.itertext().is_empty() {
			return self.comment(format_args!("Unprocessed type: {}", ty.name));
		}

		match ty.category {
			Some(TypeCategory::Bitmask) => self.add_name("flags", &ty.name, PyValue::quoted(ty.requires.as_deref())),
			Some(TypeCategory::Enum) => self.add_name("enums", &ty.name, PyValue::Str("@STOPHERE@".to_string())),
			Some(TypeCategory::Funcpointer) => self.add_name("funcpointers", &ty.name, PyValue::None),
			Some(TypeCategory::Handle | TypeCategory::Define) => self.add_name("structs", &ty.name, PyValue::None),
			category => self.comment(format_args!("Unprocessed type: {} category: {}",
				ty.name, category.map_or("None", TypeCategory::as_str)))
		}
	}

	fn gen_struct(&mut self, ty: &TypeInfo) -> Result<()> {
		let members = ty.members.iter()
			.map(|m| m.name().to_string())
			.collect();
		self.add_name("structs", &ty.name, PyValue::List(members))
	}

	fn gen_group(&mut self, group: &Group) -> Result<()> {
		let names = group.enums.iter()
			.map(|e| e.name.clone())
			.collect::<Vec<_>>();
		for name in &names {
			self.add_name("consts", name, PyValue::Str(group.name.clone()))?;
		}
		self.add_name("enums", &group.name, PyValue::List(names))
	}

	fn gen_enum(&mut self, e: &Enumerant) -> Result<()> {
		self.add_name("consts", &e.name, PyValue::None)
	}

	fn gen_cmd(&mut self, cmd: &CommandInfo) -> Result<()> {
		let params = cmd.params.iter()
			.map(|p| p.name().to_string())
			.collect();
		self.add_name("protos", &cmd.name, PyValue::List(params))
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	const REGISTRY: &str = r#"<registry>
	<types>
		<type requires="VkCullModeFlagBits" category="bitmask">typedef <type>VkFlags</type> <name>VkCullModeFlags</name>;</type>
		<type category="bitmask">typedef <type>VkFlags</type> <name>VkInstanceCreateFlags</name>;</type>
		<type category="handle"><type>VK_DEFINE_HANDLE</type>(<name>VkDevice</name>)</type>
		<type name="VkImageType" category="enum"/>
		<type category="basetype">typedef <type>uint32_t</type> <name>VkBool32</name>;</type>
		<type category="struct" name="VkOffset2D">
			<member><type>int32_t</type> <name>x</name></member>
			<member><type>int32_t</type> <name>y</name></member>
		</type>
	</types>
	<enums name="VkImageType" type="enum">
		<enum value="0" name="VK_IMAGE_TYPE_1D"/>
		<enum value="1" name="VK_IMAGE_TYPE_2D"/>
	</enums>
	<commands>
		<command>
			<proto><type>void</type> <name>vkGetDeviceQueue</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param><type>uint32_t</type> <name>queueIndex</name></param>
		</command>
	</commands>
</registry>"#;

	#[test]
	fn index() {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut buf = Vec::new();
		{
			let mut gen = PyOutputGenerator::with_writer(&reg, PyGeneratorOptions::default(), &mut buf);
			gen.begin_file().unwrap();
			gen.begin_feature(&Feature::default(), true).unwrap();
			for ty in ["VkCullModeFlags", "VkInstanceCreateFlags", "VkDevice", "VkImageType", "VkBool32", "VkOffset2D"] {
				gen.generate(Construct::Type(&reg.types[ty])).unwrap();
			}
			gen.generate(Construct::Group(&reg.groups["VkImageType"])).unwrap();
			gen.generate(Construct::Enum(&Enumerant { name: "VK_TRUE".to_string(), ..Enumerant::default() })).unwrap();
			gen.generate(Construct::Command(&reg.commands["vkGetDeviceQueue"])).unwrap();
			gen.end_feature().unwrap();
			gen.end_file().unwrap();
		}

		assert_eq!(String::from_utf8(buf).unwrap(), "\
flags = {}
enums = {}
structs = {}
consts = {}
enums = {}
consts = {}
protos = {}
funcpointers = {}
flags['VkCullModeFlags'] =  'VkCullModeFlagBits'
flags['VkInstanceCreateFlags'] =  None
structs['VkDevice'] =  None
# Unprocessed type: VkImageType
# Unprocessed type: VkBool32 category: basetype
structs['VkOffset2D'] =  ['x', 'y']
consts['VK_IMAGE_TYPE_1D'] =  'VkImageType'
consts['VK_IMAGE_TYPE_2D'] =  'VkImageType'
enums['VkImageType'] =  ['VK_IMAGE_TYPE_1D', 'VK_IMAGE_TYPE_2D']
consts['VK_TRUE'] =  None
protos['vkGetDeviceQueue'] =  ['device', 'queueIndex']
");
	}

	#[test]
	fn literals() {
		assert_eq!(PyValue::List(Vec::new()).to_string(), "[]");
		assert_eq!(PyValue::quoted(Some("")).to_string(), "None");
	}
}
