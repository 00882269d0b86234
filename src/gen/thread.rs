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

//! Wrappers of API entry points that track which objects are read and written by each call.

use {
	super::{*, decl::*},
	crate::options::ThreadGeneratorOptions,
	std::io::Write
};

const DISPATCHABLE_OBJECTS: [&str; 4] = [
	"VkCommandBuffer",
	"VkDevice",
	"VkInstance",
	"VkQueue"
];

const NON_DISPATCHABLE_OBJECTS: [&str; 19] = [
	"VkBuffer",
	"VkBufferView",
	"VkCommandPool",
	"VkDescriptorPool",
	"VkDescriptorSetLayout",
	"VkDeviceMemory",
	"VkEvent",
	"VkFence",
	"VkFramebuffer",
	"VkImage",
	"VkImageView",
	"VkPipeline",
	"VkPipelineCache",
	"VkPipelineLayout",
	"VkQueryPool",
	"VkRenderPass",
	"VkSampler",
	"VkSemaphore",
	"VkShaderModule"
];

/// Implemented by the layer interface itself.
const INTERFACE_FUNCTIONS: [&str; 3] = [
	"vkEnumerateInstanceLayerProperties",
	"vkEnumerateInstanceExtensionProperties",
	"vkEnumerateDeviceLayerProperties"
];

/// Declared here and implemented by hand.
const SPECIAL_FUNCTIONS: [&str; 10] = [
	"vkGetDeviceProcAddr",
	"vkGetInstanceProcAddr",
	"vkCreateDevice",
	"vkDestroyDevice",
	"vkCreateInstance",
	"vkDestroyInstance",
	"vkAllocateCommandBuffers",
	"vkFreeCommandBuffers",
	"vkCreateDebugReportCallbackEXT",
	"vkDestroyDebugReportCallbackEXT"
];

fn is_tracked_object(ty: &str) -> bool {
	DISPATCHABLE_OBJECTS.contains(&ty) || NON_DISPATCHABLE_OBJECTS.contains(&ty)
}

/// The count of a nested array, `pSubmits[index].pWaitSemaphores[]` is counted by
/// `pSubmits[index].waitSemaphoreCount`.
fn nested_count(element: &str) -> String {
	let end = element.find("s[]").unwrap_or(element.len());
	let limit = format!("{}Count", &element[..end]);

	match limit.rfind(".p") {
		Some(dot) => {
			let rest = &limit[dot + 2..];
			let mut chars = rest.chars();
			match chars.next() {
				Some(c) => format!("{}{}{}", &limit[..=dot], c.to_lowercase(), chars.as_str()),
				None => limit
			}
		}
		None => limit
	}
}

/// The tracking calls of a command, with `prefix` being `start` or `finish`. `None` if the
/// command touches no tracked object.
pub fn make_thread_use_block(cmd: &CommandInfo, prefix: &str) -> Option<String> {
	let mut block = String::new();

	for param in &cmd.params {
		let name = param.name();
		match (param.externsync.as_deref(), param.len.as_deref()) {
			(Some("true"), Some(len)) => {
				block.push_str(&format!("    for (uint32_t index=0;index<{};index++) {{\n", len));
				block.push_str(&format!("        {}WriteObject(my_data, {}[index]);\n", prefix, name));
				block.push_str("    }\n");
			}
			(Some("true"), None) => block.push_str(&format!("    {}WriteObject(my_data, {});\n", prefix, name)),
			(Some(members), Some(len)) => {
				block.push_str(&format!("    for (uint32_t index=0;index<{};index++) {{\n", len));
				for member in members.split(',') {
					let element = member.replacen("[]", "[index]", 1);
					if element.contains("[]") {
						block.push_str(&format!("        for(uint32_t index2=0;index2<{};index2++)\n", nested_count(&element)));
						block.push_str(&format!("            {}WriteObject(my_data, {});\n", prefix, element.replace("[]", "[index2]")));
					} else {
						block.push_str(&format!("        {}WriteObject(my_data, {});\n", prefix, element));
					}
				}
				block.push_str("    }\n");
			}
			(Some(members), None) => for member in members.split(',') {
				block.push_str(&format!("    {}WriteObject(my_data, {});\n", prefix, member));
			},
			(None, len) if is_tracked_object(param.type_name()) => match len {
				Some(len) if name != "pPipelines" => {
					block.push_str(&format!("    for (uint32_t index=0;index<{};index++) {{\n", len));
					block.push_str(&format!("        {}ReadObject(my_data, {}[index]);\n", prefix, name));
					block.push_str("    }\n");
				}
				// created by the call, not read
				_ if param.is_pointer() => (),
				_ => block.push_str(&format!("    {}ReadObject(my_data, {});\n", prefix, name))
			},
			(None, _) => ()
		}
	}

	for param in cmd.params.iter().filter(|p| p.externsync.is_some()) {
		let object = match param.externsync.as_deref() {
			Some("true") if param.len.is_some() => format!("each member of {}", param.name()),
			Some("true") if param.is_pointer() => format!("the object referenced by {}", param.name()),
			Some("true") => param.name().to_string(),
			sync => sync.unwrap_or_default().to_string()
		};
		block.push_str(&format!("// Host access to {} must be externally synchronized\n", object));
	}

	for implicit in &cmd.implicit_externsync {
		block.push_str(&format!("    // {} must be externally synchronized between host accesses\n", implicit));
	}

	match block.is_empty() {
		true => None,
		false => Some(block)
	}
}

pub struct ThreadOutputGenerator<'a> {
	base:       GenBase<'a>,
	opts:       ThreadGeneratorOptions,
	/// Wrappers of the current feature.
	commands:   Vec<String>,
	/// Entries of the `procmap` table, collected over all features.
	intercepts: Vec<String>
}

impl<'a> ThreadOutputGenerator<'a> {
	pub fn new(registry: &'a Registry, opts: ThreadGeneratorOptions) -> Self {
		Self { base: GenBase::new(registry), opts, commands: Vec::new(), intercepts: Vec::new() }
	}

	pub fn with_writer(registry: &'a Registry, opts: ThreadGeneratorOptions, writer: &'a mut dyn io::Write) -> Self {
		Self { base: GenBase::with_writer(registry, writer), opts, commands: Vec::new(), intercepts: Vec::new() }
	}

	fn protected_file(&self) -> Option<String> {
		match self.opts.decl.protect_file {
			true => self.opts.common.basename().map(|f| format!("__{}", header_symbol(f))),
			false => None
		}
	}

	fn intercept(&mut self, name: &str) {
		if !self.base.emit() {
			return;
		}

		let protect = self.base.protect().map(String::from);
		if let Some(protect) = &protect {
			self.intercepts.push(format!("#ifdef {}", protect));
		}
		self.intercepts.push(format!("    {{\"{}\", reinterpret_cast<PFN_vkVoidFunction>({})}},", name, strip_vk(name)));
		if protect.is_some() {
			self.intercepts.push("#endif".to_string());
		}
	}
}

fn strip_vk(name: &str) -> &str {
	name.strip_prefix("vk").unwrap_or(name)
}

impl OutputGenerator for ThreadOutputGenerator<'_> {
	fn active_feature(&self) -> Option<&ActiveFeature> {
		self.base.feature.as_ref()
	}

	fn begin_file(&mut self) -> Result<()> {
		self.base.open(self.opts.dir.gen_directory.as_deref(), self.opts.common.filename.as_deref())?;
		self.intercepts.clear();
		let sym = self.protected_file();
		let out = &mut self.base.out;

		if let Some(sym) = sym {
			writeln!(out, "#ifndef {}", sym)?;
			writeln!(out, "#define {} 1", sym)?;
			writeln!(out)?;
		}
		writeln!(out, "namespace threading {{")?;
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
		writeln!(out, "// intercepts")?;
		writeln!(out, "struct {{ const char* name; PFN_vkVoidFunction pFunc;}} procmap[] = {{")?;
		writeln!(out, "{}", self.intercepts.join("\n"))?;
		writeln!(out, "}};")?;
		writeln!(out)?;
		writeln!(out)?;
		writeln!(out, "}} // namespace threading")?;
		if protected {
			writeln!(out)?;
			writeln!(out, "#endif")?;
		}
		self.base.close()
	}

	fn begin_feature(&mut self, feature: &Feature, emit: bool) -> Result<()> {
		self.base.begin_feature(feature, emit);
		self.commands.clear();
		Ok(())
	}

	fn end_feature(&mut self) -> Result<()> {
		let commands = std::mem::take(&mut self.commands);

		if self.base.emit() {
			let protect_feature = self.opts.decl.protect_feature;
			let name = self.base.feature_name().to_string();
			let protect = self.base.protect().map(String::from);
			let out = &mut self.base.out;

			writeln!(out)?;
			if protect_feature {
				writeln!(out, "#ifndef {}", name)?;
			}
			if let Some(protect) = &protect {
				writeln!(out, "#ifdef {}", protect)?;
			}
			if !commands.is_empty() {
				writeln!(out, "{}", commands.join("\n"))?;
			}
			if let Some(protect) = &protect {
				writeln!(out, "#endif /* {} */", protect)?;
			}
			if protect_feature {
				writeln!(out, "#endif /* {} */", name)?;
			}
		}

		self.base.end_feature();
		Ok(())
	}

	fn gen_cmd(&mut self, cmd: &CommandInfo) -> Result<()> {
		let name = cmd.name.as_str();
		if INTERFACE_FUNCTIONS.contains(&name) {
			return Ok(());
		}

		let decl = &self.opts.decl;
		let decls = make_c_decls_with(decl, cmd, |name, tail| format!("{}{}{}", decl.apientry, strip_vk(name), tail));

		if SPECIAL_FUNCTIONS.contains(&name) {
			self.commands.push(String::new());
			self.commands.push("// declare only".to_string());
			self.commands.push(decls.proto);
			self.intercept(name);
			return Ok(());
		}

		if name.contains("KHR") {
			self.commands.push(format!("// TODO - not wrapping KHR function {}", name));
			return Ok(());
		}
		if name.contains("DebugMarker") && name.contains("EXT") {
			self.commands.push(format!("// TODO - not wrapping EXT function {}", name));
			return Ok(());
		}

		let (start, finish) = match (make_thread_use_block(cmd, "start"), make_thread_use_block(cmd, "finish")) {
			(Some(start), Some(finish)) => (start, finish),
			_ => {
				log::debug!("not intercepting command `{}` without tracked objects", name);
				return Ok(());
			}
		};
		let dispatchable = cmd.params.first()
			.ok_or_else(|| Error::Unsupported(format!("command `{}` has no dispatchable parameter", name)))?;
		self.intercept(name);

		let proto = decls.proto.strip_suffix(';').unwrap_or(&decls.proto);
		self.commands.push(String::new());
		self.commands.push(proto.to_string());
		self.commands.push("{".to_string());
		self.commands.push(format!("    dispatch_key key = get_dispatch_key({});", dispatchable.name()));
		self.commands.push("    layer_data *my_data = get_my_data_ptr(key, layer_data_map);".to_string());
		self.commands.push(match dispatchable.type_name() {
			"VkPhysicalDevice" | "VkInstance" => "    VkLayerInstanceDispatchTable *pTable = my_data->instance_dispatch_table;",
			_ => "    VkLayerDispatchTable *pTable = my_data->device_dispatch_table;"
		}.to_string());

		let result = match cmd.result_type() {
			"void" | "" => None,
			ty => Some(ty)
		};
		if let Some(ty) = result {
			self.commands.push(format!("    {} result;", ty));
		}

		let args = cmd.params.iter()
			.map(Member::name)
			.collect::<Vec<_>>()
			.join(",");
		self.commands.push(start);
		self.commands.push(format!("    {}{}({});",
			if result.is_some() { "result = " } else { "" },
			name.replacen("vk", "pTable->", 1),
			args));
		self.commands.push(finish);

		if result.is_some() {
			self.commands.push("    return result;".to_string());
		}
		self.commands.push("}".to_string());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq, crate::options::*};

	const REGISTRY: &str = r#"<registry>
	<commands>
		<command>
			<proto><type>VkResult</type> <name>vkEnumerateInstanceLayerProperties</name></proto>
			<param optional="false,true"><type>uint32_t</type>* <name>pPropertyCount</name></param>
		</command>
		<command>
			<proto><type>VkResult</type> <name>vkCreateInstance</name></proto>
			<param>const <type>VkInstanceCreateInfo</type>* <name>pCreateInfo</name></param>
			<param><type>VkInstance</type>* <name>pInstance</name></param>
		</command>
		<command>
			<proto><type>void</type> <name>vkDestroyFence</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param optional="true" externsync="true"><type>VkFence</type> <name>fence</name></param>
			<param optional="true">const <type>VkAllocationCallbacks</type>* <name>pAllocator</name></param>
		</command>
		<command>
			<proto><type>void</type> <name>vkGetPhysicalDeviceFeatures</name></proto>
			<param><type>VkPhysicalDevice</type> <name>physicalDevice</name></param>
			<param><type>VkPhysicalDeviceFeatures</type>* <name>pFeatures</name></param>
		</command>
		<command>
			<proto><type>VkResult</type> <name>vkCreateWin32SurfaceKHR</name></proto>
			<param><type>VkInstance</type> <name>instance</name></param>
		</command>
		<command>
			<proto><type>VkResult</type> <name>vkGetMemoryWin32HandleNV</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param><type>VkDeviceMemory</type> <name>memory</name></param>
			<param><type>VkExternalMemoryHandleTypeFlagsNV</type> <name>handleType</name></param>
			<param><type>HANDLE</type>* <name>pHandle</name></param>
		</command>
		<command>
			<proto><type>VkResult</type> <name>vkQueueSubmit</name></proto>
			<param externsync="true"><type>VkQueue</type> <name>queue</name></param>
			<param optional="true"><type>uint32_t</type> <name>submitCount</name></param>
			<param len="submitCount" externsync="pSubmits[].pWaitSemaphores[]">const <type>VkSubmitInfo</type>* <name>pSubmits</name></param>
			<param optional="true" externsync="true"><type>VkFence</type> <name>fence</name></param>
		</command>
		<command>
			<proto><type>void</type> <name>vkFreeDescriptorSets</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param><type>uint32_t</type> <name>descriptorSetCount</name></param>
			<param len="descriptorSetCount" externsync="true">const <type>VkDescriptorSet</type>* <name>pDescriptorSets</name></param>
			<implicitexternsyncparams>
				<param>the sname:VkDescriptorPool the sets were allocated from</param>
			</implicitexternsyncparams>
		</command>
	</commands>
</registry>"#;

	#[test]
	fn nested_counts() {
		assert_eq!(nested_count("pSubmits[index].pWaitSemaphores[]"), "pSubmits[index].waitSemaphoreCount");
		assert_eq!(nested_count("pBindInfos[index].pImageBinds[]"), "pBindInfos[index].imageBindCount");
	}

	#[test]
	fn use_blocks() {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();

		assert_eq!(make_thread_use_block(&reg.commands["vkQueueSubmit"], "start").unwrap(), concat!(
			"    startWriteObject(my_data, queue);\n",
			"    for (uint32_t index=0;index<submitCount;index++) {\n",
			"        for(uint32_t index2=0;index2<pSubmits[index].waitSemaphoreCount;index2++)\n",
			"            startWriteObject(my_data, pSubmits[index].pWaitSemaphores[index2]);\n",
			"    }\n",
			"    startWriteObject(my_data, fence);\n",
			"// Host access to queue must be externally synchronized\n",
			"// Host access to pSubmits[].pWaitSemaphores[] must be externally synchronized\n",
			"// Host access to fence must be externally synchronized\n"));

		assert_eq!(make_thread_use_block(&reg.commands["vkFreeDescriptorSets"], "finish").unwrap(), concat!(
			"    finishReadObject(my_data, device);\n",
			"    for (uint32_t index=0;index<descriptorSetCount;index++) {\n",
			"        finishWriteObject(my_data, pDescriptorSets[index]);\n",
			"    }\n",
			"// Host access to each member of pDescriptorSets must be externally synchronized\n",
			"    // the sname:VkDescriptorPool the sets were allocated from must be externally synchronized between host accesses\n"));

		assert_eq!(make_thread_use_block(&reg.commands["vkGetPhysicalDeviceFeatures"], "start"), None);
	}

	#[test]
	fn wrappers() {
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let opts = ThreadGeneratorOptions {
			common: CommonOptions::new("thread_check.h", "vulkan"),
			decl:   CDeclOptions {
				apicall:  "VKAPI_ATTR ".to_string(),
				apientry: "VKAPI_CALL ".to_string(),
				..CDeclOptions::default()
			},
			..ThreadGeneratorOptions::default()
		};
		let features = [
			(Feature { name: "VK_VERSION_1_0".to_string(), ..Feature::default() },
				&["vkEnumerateInstanceLayerProperties", "vkCreateInstance", "vkDestroyFence", "vkGetPhysicalDeviceFeatures"][..]),
			(Feature {
				name:    "VK_KHR_win32_surface".to_string(),
				protect: Some("VK_USE_PLATFORM_WIN32_KHR".to_string()),
				..Feature::default()
			}, &["vkCreateWin32SurfaceKHR"][..]),
			(Feature {
				name:    "VK_NV_external_memory_win32".to_string(),
				protect: Some("VK_USE_PLATFORM_WIN32_KHR".to_string()),
				..Feature::default()
			}, &["vkGetMemoryWin32HandleNV"][..])
		];

		let mut buf = Vec::new();
		{
			let mut gen = ThreadOutputGenerator::with_writer(&reg, opts, &mut buf);
			gen.begin_file().unwrap();
			for (feature, commands) in &features {
				gen.begin_feature(feature, true).unwrap();
				for cmd in *commands {
					gen.generate(Construct::Command(&reg.commands[*cmd])).unwrap();
				}
				gen.end_feature().unwrap();
			}
			gen.begin_feature(&Feature { name: "VK_VERSION_1_1".to_string(), ..Feature::default() }, false).unwrap();
			gen.generate(Construct::Command(&reg.commands["vkQueueSubmit"])).unwrap();
			gen.end_feature().unwrap();
			gen.end_file().unwrap();
		}

		assert_eq!(String::from_utf8(buf).unwrap(), r#"#ifndef __thread_check_h_
#define __thread_check_h_ 1

namespace threading {


#ifndef VK_VERSION_1_0

// declare only
VKAPI_ATTR VkResult VKAPI_CALL CreateInstance(
    const VkInstanceCreateInfo* pCreateInfo,
    VkInstance* pInstance);

VKAPI_ATTR void VKAPI_CALL DestroyFence(
    VkDevice device,
    VkFence fence,
    const VkAllocationCallbacks* pAllocator)
{
    dispatch_key key = get_dispatch_key(device);
    layer_data *my_data = get_my_data_ptr(key, layer_data_map);
    VkLayerDispatchTable *pTable = my_data->device_dispatch_table;
    startReadObject(my_data, device);
    startWriteObject(my_data, fence);
// Host access to fence must be externally synchronized

    pTable->DestroyFence(device,fence,pAllocator);
    finishReadObject(my_data, device);
    finishWriteObject(my_data, fence);
// Host access to fence must be externally synchronized

}
#endif /* VK_VERSION_1_0 */

#ifndef VK_KHR_win32_surface
#ifdef VK_USE_PLATFORM_WIN32_KHR
// TODO - not wrapping KHR function vkCreateWin32SurfaceKHR
#endif /* VK_USE_PLATFORM_WIN32_KHR */
#endif /* VK_KHR_win32_surface */

#ifndef VK_NV_external_memory_win32
#ifdef VK_USE_PLATFORM_WIN32_KHR

VKAPI_ATTR VkResult VKAPI_CALL GetMemoryWin32HandleNV(
    VkDevice device,
    VkDeviceMemory memory,
    VkExternalMemoryHandleTypeFlagsNV handleType,
    HANDLE* pHandle)
{
    dispatch_key key = get_dispatch_key(device);
    layer_data *my_data = get_my_data_ptr(key, layer_data_map);
    VkLayerDispatchTable *pTable = my_data->device_dispatch_table;
    VkResult result;
    startReadObject(my_data, device);
    startReadObject(my_data, memory);

    result = pTable->GetMemoryWin32HandleNV(device,memory,handleType,pHandle);
    finishReadObject(my_data, device);
    finishReadObject(my_data, memory);

    return result;
}
#endif /* VK_USE_PLATFORM_WIN32_KHR */
#endif /* VK_NV_external_memory_win32 */

// intercepts
struct { const char* name; PFN_vkVoidFunction pFunc;} procmap[] = {
    {"vkCreateInstance", reinterpret_cast<PFN_vkVoidFunction>(CreateInstance)},
    {"vkDestroyFence", reinterpret_cast<PFN_vkVoidFunction>(DestroyFence)},
#ifdef VK_USE_PLATFORM_WIN32_KHR
    {"vkGetMemoryWin32HandleNV", reinterpret_cast<PFN_vkVoidFunction>(GetMemoryWin32HandleNV)},
#endif
};


} // namespace threading

#endif
"#);
	}
}
