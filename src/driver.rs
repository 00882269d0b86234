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

//! Feature selection and traversal of the registry.

use {
	crate::{parse::*, gen::*, error::Result, options::CommonOptions},
	std::collections::BTreeSet
};

/// The features a run traverses, in generation order, and whether output is written for each.
pub fn select_features<'a>(registry: &'a Registry, opts: &CommonOptions) -> Result<Vec<(&'a Feature, bool)>> {
	let versions     = CommonOptions::pattern(opts.versions.as_deref())?;
	let emitversions = CommonOptions::pattern(opts.emitversions.as_deref())?;
	let default_ext  = CommonOptions::pattern(opts.default_extensions.as_deref())?;
	let add_ext      = CommonOptions::pattern(opts.add_extensions.as_deref())?;
	let remove_ext   = CommonOptions::pattern(opts.remove_extensions.as_deref())?;

	let mut features = Vec::new();
	for feature in &registry.features {
		let include = match feature.kind {
			FeatureKind::Feature => {
				let api = match (&opts.apiname, &feature.api) {
					(Some(apiname), Some(api)) => apiname == api,
					_ => true
				};
				api && matches_start(&versions, &feature.version)
			}
			FeatureKind::Extension => {
				let supported = feature.supported.as_deref().unwrap_or_default();
				(matches_start(&default_ext, supported) || matches_start(&add_ext, &feature.name))
					&& !matches_start(&remove_ext, &feature.name)
			}
		};

		if include {
			log::debug!("including feature `{}`", feature.name);
			features.push(feature);
		} else {
			log::debug!("skipping feature `{}`", feature.name);
		}
	}

	if opts.sort {
		sort_features(&mut features);
	}

	Ok(features.into_iter()
		.map(|f| (f, f.kind == FeatureKind::Extension || matches_start(&emitversions, &f.version)))
		.collect())
}

fn profile_matches(interface: &Interface, opts: &CommonOptions) -> bool {
	match (&interface.profile, &opts.profile) {
		(Some(profile), Some(wanted)) => profile == wanted,
		_ => true
	}
}

/// Generates every construct required by the selected features with `generator`.
pub fn api_gen(registry: &Registry, generator: &mut dyn OutputGenerator, opts: &CommonOptions) -> Result<()> {
	let features = select_features(registry, opts)?;
	let removed = features.iter()
		.flat_map(|(f, _)| &f.remove)
		.filter(|i| profile_matches(i, opts))
		.flat_map(|i| i.types.iter().chain(&i.enums).chain(&i.commands))
		.cloned()
		.collect::<BTreeSet<_>>();

	let mut walker = Walker { registry, generator, removed, declared: BTreeSet::new() };
	walker.generator.begin_file()?;

	for (feature, emit) in features {
		log::debug!("generating feature `{}` (emit: {})", feature.name, emit);
		walker.generator.begin_feature(feature, emit)?;
		for interface in feature.require.iter().filter(|i| profile_matches(i, opts)) {
			for name in &interface.types {
				walker.gen_type(name, false)?;
			}
			for name in &interface.enums {
				walker.gen_enum(name)?;
			}
			for name in &interface.commands {
				walker.gen_cmd(name)?;
			}
		}
		walker.generator.end_feature()?;
	}

	walker.generator.end_file()
}

struct Walker<'a, 'b> {
	registry:  &'a Registry,
	generator: &'b mut dyn OutputGenerator,
	/// Names removed by a `<remove>` block.
	removed:   BTreeSet<String>,
	/// Names already generated in this run.
	declared:  BTreeSet<String>
}

impl Walker<'_, '_> {
	/// Whether `name` still has to be generated, marking it as generated.
	fn claim(&mut self, kind: &str, name: &str) -> bool {
		if self.removed.contains(name) {
			log::debug!("{} `{}` is removed", kind, name);
			return false;
		}
		self.declared.insert(name.to_string())
	}

	/// Generates a type after the types it depends on.
	fn gen_type(&mut self, name: &str, dependency: bool) -> Result<()> {
		let registry = self.registry;
		let (ty, group) = (registry.get_type(name), registry.get_group(name));
		if ty.is_none() && group.is_none() {
			match dependency {
				true => log::debug!("dependency `{}` is not a registry type", name),
				false => log::warn!("type `{}` not found", name)
			}
			return Ok(());
		}

		if !self.claim("type", name) {
			return Ok(());
		}

		if let Some(ty) = ty {
			if let Some(requires) = &ty.requires {
				self.gen_type(requires, true)?;
			}
			for member in &ty.members {
				self.gen_type(member.type_name(), true)?;
			}
		}

		match (ty, group) {
			(Some(ty), Some(group)) if ty.category == Some(TypeCategory::Enum) => self.generator.generate(Construct::Group(group)),
			(Some(ty), _) => self.generator.generate(Construct::Type(ty)),
			(None, Some(group)) => self.generator.generate(Construct::Group(group)),
			(None, None) => Ok(())
		}
	}

	fn gen_enum(&mut self, name: &str) -> Result<()> {
		let registry = self.registry;
		match registry.enums.get(name) {
			Some(e) => match self.claim("enum", name) {
				true => self.generator.generate(Construct::Enum(e)),
				false => Ok(())
			},
			None if registry.groups.values().any(|g| g.enums.iter().any(|e| e.name == name)) => {
				log::debug!("enumerant `{}` is generated with its group", name);
				Ok(())
			}
			None => {
				log::warn!("enum `{}` not found", name);
				Ok(())
			}
		}
	}

	/// Generates a command after the types of its parameters.
	fn gen_cmd(&mut self, name: &str) -> Result<()> {
		let registry = self.registry;
		let cmd = match registry.get_command(name) {
			Some(cmd) => cmd,
			None => {
				log::warn!("command `{}` not found", name);
				return Ok(());
			}
		};

		if !self.claim("command", name) {
			return Ok(());
		}

		self.gen_type(cmd.proto.type_name(), true)?;
		for param in &cmd.params {
			self.gen_type(param.type_name(), true)?;
		}
		self.generator.generate(Construct::Command(cmd))
	}
}
