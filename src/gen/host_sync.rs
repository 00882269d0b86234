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

//! Tables of externally synchronized parameters, collected over all commands.

use {
	super::{*, validity::{BANNER, pname, flink}},
	crate::options::HostSyncGeneratorOptions,
	std::io::Write
};

/// Turns `pCreateInfos[].pNext` into `The pname:pNext member of each element of the pname:pCreateInfos parameter`.
pub fn dereference_human_readable(dereference: &str) -> String {
	static PARTS: OnceLock<Regex> = OnceLock::new();
	static WORD: OnceLock<Regex> = OnceLock::new();
	let parts = PARTS.get_or_init(|| Regex::new(r"\w+\W*").expect("valid pattern"));
	let word = WORD.get_or_init(|| Regex::new(r"\w+").expect("valid pattern"));

	let mut s = String::new();
	let matches = parts.find_iter(dereference).map(|m| m.as_str()).collect::<Vec<_>>();
	for part in matches.into_iter().rev() {
		if part.contains("->") || part.contains('.') {
			s.push_str("member of ");
		}
		if part.contains("[]") {
			s.push_str("each element of ");
		}
		s.push_str("the ");
		s.push_str(&pname(word.find(part).map_or("", |m| m.as_str())));
		s.push(' ');
	}
	s.push_str("parameter");

	let mut chars = s.chars();
	match chars.next() {
		Some(c) => c.to_uppercase().chain(chars).collect(),
		None => s
	}
}

/// The three lists written by [`HostSyncOutputGenerator`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostSyncTables {
	pub parameters:     String,
	pub parameterlists: String,
	pub implicit:       String
}

impl HostSyncTables {
	pub fn add_command(&mut self, cmd: &CommandInfo) {
		for param in &cmd.params {
			for sync in param.externsync.iter().flat_map(|e| e.split(',')) {
				let mut line = "* ".to_string();
				match sync {
					"true" => {
						line.push_str(if param.len.is_some() {
							"Each element of the "
						} else if param.is_pointer() {
							"The object referenced by the "
						} else {
							"The "
						});
						line.push_str(&pname(param.name()));
						line.push_str(" parameter");
					}
					sync => line.push_str(&dereference_human_readable(sync))
				}
				line.push_str(&format!(" in {}\n", flink(&cmd.name)));

				match line.contains(" element of ") {
					true => self.parameterlists.push_str(&line),
					false => self.parameters.push_str(&line)
				}
			}
		}

		for param in &cmd.implicit_externsync {
			let mut chars = param.chars();
			if let Some(c) = chars.next() {
				self.implicit.push_str("* ");
				self.implicit.extend(c.to_uppercase());
				self.implicit.push_str(chars.as_str());
				self.implicit.push_str(&format!(" in {}\n", flink(&cmd.name)));
			}
		}

		if cmd.name.contains("vkCmd") {
			self.implicit.push_str(&format!("* The sname:VkCommandPool that pname:commandBuffer was allocated from, in {}\n",
				flink(&cmd.name)));
		}
	}
}

pub struct HostSyncOutputGenerator<'a> {
	base:   GenBase<'a>,
	opts:   HostSyncGeneratorOptions,
	tables: HostSyncTables
}

impl<'a> HostSyncOutputGenerator<'a> {
	pub fn new(registry: &'a Registry, opts: HostSyncGeneratorOptions) -> Self {
		Self { base: GenBase::new(registry), opts, tables: HostSyncTables::default() }
	}

	pub fn tables(&self) -> &HostSyncTables {
		&self.tables
	}

	fn write_table(&self, name: &str, title: &str, contents: &str) -> Result<()> {
		let dir = self.opts.dir.dir().join(self.opts.common.filename.as_deref().unwrap_or_default());
		let path = dir.join(name);
		log::debug!("generating include file `{}`", path.display());
		fs::create_dir_all(&dir)?;

		let mut file = io::BufWriter::new(fs::File::create(&path)?);
		writeln!(file, "{}", BANNER)?;
		writeln!(file, ".{}", title)?;
		writeln!(file, "{}", "*".repeat(80))?;
		write!(file, "{}", contents)?;
		writeln!(file, "{}", "*".repeat(80))?;
		writeln!(file)?;
		file.flush()?;
		Ok(())
	}
}

impl OutputGenerator for HostSyncOutputGenerator<'_> {
	fn active_feature(&self) -> Option<&ActiveFeature> {
		self.base.feature.as_ref()
	}

	fn begin_file(&mut self) -> Result<()> {
		self.tables = HostSyncTables::default();
		Ok(())
	}

	fn end_file(&mut self) -> Result<()> {
		self.write_table("parameters.txt", "Externally Synchronized Parameters", &self.tables.parameters)?;
		self.write_table("parameterlists.txt", "Externally Synchronized Parameter Lists", &self.tables.parameterlists)?;
		self.write_table("implicit.txt", "Implicit Externally Synchronized Parameters", &self.tables.implicit)
	}

	fn begin_feature(&mut self, feature: &Feature, emit: bool) -> Result<()> {
		self.base.begin_feature(feature, emit);
		Ok(())
	}

	fn end_feature(&mut self) -> Result<()> {
		self.base.end_feature();
		Ok(())
	}

	fn gen_cmd(&mut self, cmd: &CommandInfo) -> Result<()> {
		if self.base.emit() {
			self.tables.add_command(cmd);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq, crate::options::*};

	const REGISTRY: &str = r#"<registry>
	<commands>
		<command>
			<proto><type>void</type> <name>vkDestroyFence</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param optional="true" externsync="true"><type>VkFence</type> <name>fence</name></param>
		</command>
		<command>
			<proto><type>VkResult</type> <name>vkCreateGraphicsPipelines</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<param externsync="pCreateInfos[].basePipelineHandle"><type>uint32_t</type> <name>createInfoCount</name></param>
			<param len="createInfoCount">const <type>VkGraphicsPipelineCreateInfo</type>* <name>pCreateInfos</name></param>
		</command>
		<command>
			<proto><type>VkResult</type> <name>vkQueueSubmit</name></proto>
			<param externsync="true"><type>VkQueue</type> <name>queue</name></param>
			<param len="submitCount" externsync="true">const <type>VkSubmitInfo</type>* <name>pSubmits</name></param>
		</command>
		<command>
			<proto><type>void</type> <name>vkCmdDraw</name></proto>
			<param externsync="true"><type>VkCommandBuffer</type> <name>commandBuffer</name></param>
		</command>
		<command>
			<proto><type>VkResult</type> <name>vkAllocateDescriptorSets</name></proto>
			<param><type>VkDevice</type> <name>device</name></param>
			<implicitexternsyncparams>
				<param>the sname:VkDescriptorPool the pname:pAllocateInfo->descriptorPool</param>
			</implicitexternsyncparams>
		</command>
	</commands>
</registry>"#;

	#[test]
	fn dereferences() {
		assert_eq!(dereference_human_readable("pCreateInfos[].basePipelineHandle"),
			"The pname:basePipelineHandle member of each element of the pname:pCreateInfos parameter");
		assert_eq!(dereference_human_readable("pAllocateInfo->descriptorPool"),
			"The pname:descriptorPool member of the pname:pAllocateInfo parameter");
	}

	#[test]
	fn tables() {
		let dir = tempfile::tempdir().unwrap();
		let reg = Registry::from_xml(REGISTRY.as_bytes()).unwrap();
		let mut gen = HostSyncOutputGenerator::new(&reg, HostSyncGeneratorOptions {
			common: CommonOptions { filename: Some("hostsynctable".to_string()), ..CommonOptions::default() },
			dir:    DirOptions::new(dir.path())
		});

		gen.begin_file().unwrap();
		gen.begin_feature(&Feature::default(), true).unwrap();
		for cmd in reg.commands.values() {
			gen.generate(Construct::Command(cmd)).unwrap();
		}
		gen.end_feature().unwrap();
		gen.begin_feature(&Feature::default(), false).unwrap();
		gen.generate(Construct::Command(&reg.commands["vkDestroyFence"])).unwrap();
		gen.end_feature().unwrap();

		assert_eq!(gen.tables(), &HostSyncTables {
			parameters:     "\
* The pname:commandBuffer parameter in flink:vkCmdDraw
* The pname:fence parameter in flink:vkDestroyFence
* The pname:queue parameter in flink:vkQueueSubmit
".to_string(),
			parameterlists: "\
* The pname:basePipelineHandle member of each element of the pname:pCreateInfos parameter in flink:vkCreateGraphicsPipelines
* Each element of the pname:pSubmits parameter in flink:vkQueueSubmit
".to_string(),
			implicit:       "\
* The sname:VkDescriptorPool the pname:pAllocateInfo->descriptorPool in flink:vkAllocateDescriptorSets
* The sname:VkCommandPool that pname:commandBuffer was allocated from, in flink:vkCmdDraw
".to_string()
		});

		gen.end_file().unwrap();
		let s = std::fs::read_to_string(dir.path().join("hostsynctable/implicit.txt")).unwrap();
		assert_eq!(s, format!("{}\n.Implicit Externally Synchronized Parameters\n{}\n{}{}\n\n",
			BANNER, "*".repeat(80), gen.tables().implicit, "*".repeat(80)));
		assert!(dir.path().join("hostsynctable/parameters.txt").exists());
		assert!(dir.path().join("hostsynctable/parameterlists.txt").exists());
	}
}
