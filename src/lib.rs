//! MATLAB linker stub generation.
//!
//! Finds MATLAB installations, resolves the shared libraries that the core
//! MEX libraries pull in, and packages headers, version metadata and those
//! libraries into a small archive that is enough to link MEX binaries
//! against without a full MATLAB install.
//!
//! Uses `readelf -d` (glnxa64) and `objdump -p` (win64) to extract library
//! dependencies. Neither executes the library, so stubs for a foreign
//! platform can be built on any host with binutils.

mod analyze;
mod arch;
mod config;
mod detect;
mod discover;
mod error;
mod package;
mod paths;
mod release;
mod resolve;

pub use analyze::{
    get_dll_dependencies, get_library_dependencies, parse_objdump_output, parse_readelf_output,
    Inspector, ToolInspector,
};
pub use arch::{Arch, LIB_SEARCH_PARENT_DIRS};
pub use config::{env_var_names, roots_from_env, MATLAB_ROOT_ENV_VARS};
pub use detect::{
    detect, parse_products_filename, parse_version_tag, DirectoryInfo, MatlabRoot, PRODUCTS_DIR,
    VERSION_INFO_FILE,
};
pub use discover::{Discovery, Roots};
pub use error::StubError;
pub use package::{
    select_files, Archiver, PackageOutcome, Packager, StubOptions, TarArchiver, BASE_FILES,
    CORE_MATLAB_LIBS, DEFAULT_OUTDIR, DEFAULT_STUB_BASE_NAME, REQUIRED_FILES, STUB_EXT,
};
pub use paths::LibraryIndex;
pub use release::release_for;
pub use resolve::{resolve, Resolution};
