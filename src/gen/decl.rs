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

//! C declarations of parameters, members and commands.

use crate::{parse::*, options::CDeclOptions};

/// A command prototype and the matching function pointer typedef.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CDecls {
	/// `VkResult vkFoo(\n    int x);`, one parameter per line.
	pub proto:   String,
	/// `typedef VkResult (PFN_vkFoo)(int x);`, all parameters on one line.
	pub pointer: String
}

pub fn make_proto_name(opts: &CDeclOptions, name: &str, tail: &str) -> String {
	format!("{}{}{}", opts.apientry, name, tail)
}

pub fn make_typedef_name(opts: &CDeclOptions, name: &str, tail: &str) -> String {
	format!("({}PFN_{}{})", opts.apientryp, name, tail)
}

/// An indented declaration of a parameter or member. If `aligncol` is not 0, the name is
/// moved to that column.
pub fn make_c_param_decl(param: &Member, aligncol: usize) -> String {
	let mut decl = format!("    {}", param.decl.text);
	for node in &param.decl.nodes {
		if node.tag == "name" && aligncol > 0 {
			let len = decl.trim_end().len();
			decl.truncate(len);
			if len < aligncol {
				decl.push_str(&" ".repeat(aligncol - len));
			}
			log::debug!("aligning parameter `{}` to column {}, length {} -> {}", node.text, aligncol, len, decl.len());
		}
		decl.push_str(&node.text);
		decl.push_str(&node.tail);
	}
	decl
}

/// The length of the indented declaration up to the name, without trailing whitespace.
pub fn c_param_type_length(param: &Member) -> usize {
	let mut decl = format!("    {}", param.decl.text);
	for node in &param.decl.nodes {
		if node.tag == "name" {
			return decl.trim_end().len();
		}
		decl.push_str(&node.text);
		decl.push_str(&node.tail);
	}
	0
}

/// The body of a struct or union typedef, member names aligned past the longest type.
/// The result does not end with a newline.
pub fn make_struct_body(category: TypeCategory, name: &str, members: &[Member]) -> String {
	let target = members.iter()
		.map(c_param_type_length)
		.max()
		.unwrap_or(0);

	let mut body = format!("typedef {} {} {{\n", category, name);
	for member in members {
		body.push_str(&make_c_param_decl(member, target + 4));
		body.push_str(";\n");
	}
	body.push_str("} ");
	body.push_str(name);
	body.push(';');
	body
}

pub fn make_c_decls(opts: &CDeclOptions, cmd: &CommandInfo) -> CDecls {
	make_c_decls_with(opts, cmd, |name, tail| make_proto_name(opts, name, tail))
}

/// Like [`make_c_decls`], but the name of the prototype is formatted by `proto_name`.
pub fn make_c_decls_with(opts: &CDeclOptions, cmd: &CommandInfo, proto_name: impl Fn(&str, &str) -> String) -> CDecls {
	let mut proto = format!("{}{}", opts.apicall, cmd.proto.text);
	let mut pointer = format!("typedef {}", cmd.proto.text);

	for node in &cmd.proto.nodes {
		match node.tag.as_str() {
			"name" => {
				proto.push_str(&proto_name(&node.text, &node.tail));
				pointer.push_str(&make_typedef_name(opts, &node.text, &node.tail));
			}
			_ => for s in [&mut proto, &mut pointer] {
				s.push_str(&node.text);
				s.push_str(&node.tail);
			}
		}
	}

	if cmd.params.is_empty() {
		proto.push_str("(void);");
		pointer.push_str("(void);");
	} else {
		let indented = cmd.params.iter()
			.map(|p| make_c_param_decl(p, opts.align_func_param))
			.collect::<Vec<_>>()
			.join(",\n");
		let flat = cmd.params.iter()
			.map(Member::cdecl_text)
			.collect::<Vec<_>>()
			.join(", ");

		proto.push_str("(\n");
		proto.push_str(&indented);
		proto.push_str(");");
		pointer.push('(');
		pointer.push_str(&flat);
		pointer.push_str(");");
	}

	CDecls { proto, pointer }
}

#[cfg(test)]
mod tests {
	use {super::*, crate::xml};

	fn member(s: &str) -> Member {
		let reg = Registry::from_element(&xml::parse(format!(
			"<registry><types><type category=\"struct\" name=\"S\">{}</type></types></registry>", s).as_bytes()).unwrap())
			.unwrap();
		reg.types["S"].members[0].clone()
	}

	fn command(s: &str) -> CommandInfo {
		let reg = Registry::from_element(&xml::parse(format!(
			"<registry><commands><command>{}</command></commands></registry>", s).as_bytes()).unwrap())
			.unwrap();
		reg.commands.into_values().next().unwrap()
	}

	#[test]
	fn param_decl() {
		let m = member("<member>const <type>char</type>* <name>pName</name></member>");
		assert_eq!(make_c_param_decl(&m, 0), "    const char* pName");
		assert_eq!(c_param_type_length(&m), 15);
		assert_eq!(make_c_param_decl(&m, 20), "    const char*     pName");

		let m = member("<member><type>float</type> <name>color</name>[4]</member>");
		assert_eq!(make_c_param_decl(&m, 0), "    float color[4]");
	}

	#[test]
	fn struct_body() {
		let reg = Registry::from_element(&xml::parse(r#"<registry><types><type category="struct" name="VkExtent2D">
			<member><type>uint32_t</type> <name>width</name></member>
			<member>const <type>void</type>* <name>pNext</name></member>
		</type></types></registry>"#.as_bytes()).unwrap()).unwrap();
		let ty = &reg.types["VkExtent2D"];

		assert_eq!(make_struct_body(TypeCategory::Struct, &ty.name, &ty.members), "\
typedef struct VkExtent2D {
    uint32_t       width;
    const void*    pNext;
} VkExtent2D;");
	}

	#[test]
	fn command_decls() {
		let opts = CDeclOptions {
			apicall:   "VKAPI_ATTR ".to_string(),
			apientry:  "VKAPI_CALL ".to_string(),
			apientryp: "VKAPI_PTR *".to_string(),
			..CDeclOptions::default()
		};

		let cmd = command("<proto><type>VkResult</type> <name>vkCreateFence</name></proto>\
			<param><type>VkDevice</type> <name>device</name></param>\
			<param>const <type>VkFenceCreateInfo</type>* <name>pCreateInfo</name></param>");
		let decls = make_c_decls(&opts, &cmd);
		assert_eq!(decls.proto, "VKAPI_ATTR VkResult VKAPI_CALL vkCreateFence(\n    VkDevice device,\n    const VkFenceCreateInfo* pCreateInfo);");
		assert_eq!(decls.pointer, "typedef VkResult (VKAPI_PTR *PFN_vkCreateFence)(VkDevice device, const VkFenceCreateInfo* pCreateInfo);");
		assert_eq!(make_c_decls(&opts, &cmd), decls);

		let cmd = command("<proto><type>void</type> <name>vkNothing</name></proto>");
		let decls = make_c_decls(&opts, &cmd);
		assert_eq!(decls.proto, "VKAPI_ATTR void VKAPI_CALL vkNothing(void);");
		assert_eq!(decls.pointer, "typedef void (VKAPI_PTR *PFN_vkNothing)(void);");
	}
}
