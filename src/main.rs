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

use {vkregen::*, std::{io::{self, Write}, fs::File, path::PathBuf}};

const HELP: &str = r#"
vkregen
Usage: vkregen <registry file> --gen=<generator> [options]

The registry is read from `vk.xml`, or from a JSON snapshot if the file name ends with `.json`.

Generators:
c                                - C header
doc                              - documentation includes, one file per construct
py                               - Python name index
validity                         - validity statements
hostsync                         - tables of externally synchronized parameters
thread                           - thread safety layer sources
paramchecker                     - parameter validation layer sources

Options:
--help, -h                       - display this help page
--gen=<generator>,
-g=<generator>                   - select the generator
--config=<options file>,
-c=<options file>                - read the generator options from a JSON file, `generator` selects the generator
--out=<output file>,
-o=<output file>                 - specify the output file, if no output file is specified, the code is written to stdout
--dir=<directory>,
-d=<directory>                   - specify the output directory of generators writing multiple files

Set `RUST_LOG=debug` to print diagnostics.
"#;

fn fail(e: impl std::fmt::Display) -> ! {
	eprintln!("\x1b[31mfailed\x1b[0m\nError: {}", e);
	std::process::exit(100);
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	let mut file_in = None;
	let mut generator = None;
	let mut config = None;
	let mut file_out = None;
	let mut dir = None;

	for arg in std::env::args().skip(1) {
		if arg.starts_with('-') {
			if arg.starts_with("-g=") || arg.starts_with("--gen=") {
				generator = Some(arg.trim_start_matches("-g=")
					.trim_start_matches("--gen=").to_string());
			} else if arg.starts_with("-c=") || arg.starts_with("--config=") {
				config = Some(arg.trim_start_matches("-c=")
					.trim_start_matches("--config=").to_string());
			} else if arg.starts_with("-o=") || arg.starts_with("--out=") {
				file_out = Some(arg.trim_start_matches("-o=")
					.trim_start_matches("--out=").to_string());
			} else if arg.starts_with("-d=") || arg.starts_with("--dir=") {
				dir = Some(PathBuf::from(arg.trim_start_matches("-d=")
					.trim_start_matches("--dir=")));
			} else if arg == "-h" || arg == "--help" {
				println!("{}", HELP);
				return;
			} else {
				eprintln!("ignored unknown option: {}", arg)
			}
		} else {
			file_in = Some(arg);
		}
	}

	let file_in = match file_in {
		Some(file_in) => file_in,
		None => {
			println!("{}", HELP);
			std::process::exit(100);
		}
	};

	let mut options = match (&config, &generator) {
		(Some(config), _) => {
			eprint!("reading options `{}` ... ", config);
			io::stderr().flush().unwrap_or_default();
			match File::open(config).map_err(Error::from).and_then(|f| GeneratorOptions::from_json(io::BufReader::new(f))) {
				Ok(v) => {
					eprintln!("\x1b[32mok\x1b[0m");
					v
				}
				Err(e) => fail(e)
			}
		}
		(None, Some(name)) => match GeneratorOptions::by_name(name) {
			Some(v) => v,
			None => fail(format!("unknown generator `{}`", name))
		},
		(None, None) => fail("no generator selected, use `--gen=<generator>`")
	};

	if let Some(file_out) = file_out {
		options.common_mut().filename = Some(file_out);
	}
	if let Some(dir) = dir {
		match options.dir_mut() {
			Some(opts) => opts.gen_directory = Some(dir),
			None => eprintln!("ignored option --dir, the generator writes a single file")
		}
	}

	eprint!("parsing file `{}` ... ", &file_in);
	io::stderr().flush().unwrap_or_default();

	let registry = match File::open(&file_in)
		.map(io::BufReader::new)
		.map_err(Error::from)
		.and_then(|r| match file_in.ends_with(".json") {
			true => Registry::from_json(r),
			false => Registry::from_xml(r)
		}) {
		Ok(v) => {
			eprintln!("\x1b[32mok\x1b[0m");
			v
		}
		Err(e) => fail(e)
	};

	match options.common().filename.as_deref() {
		Some(file_out) => eprint!("generating code (dst: `{}`) ... ", file_out),
		None => eprint!("generating code ... ")
	}
	io::stderr().flush().unwrap_or_default();

	match generate(&registry, &options) {
		Ok(()) => eprintln!("\x1b[32mok\x1b[0m"),
		Err(e) => fail(e)
	}
}
