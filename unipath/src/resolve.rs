//! Finding commands in the unified search path.

use std::path::PathBuf;

use tracing::debug;
use tracing::trace;

use uni_fs::is_executable;

/// Names under `dirs` (scanned in order) that start with
/// `partial` and point to executable regular files, symlinks
/// followed. Within one directory the order is whatever the
/// filesystem enumerates, deliberately unsorted.
#[ tracing::instrument( skip( dirs ) ) ]
pub fn complete_command( dirs: &[PathBuf], partial: &str ) -> Vec<String> {
    let mut found = Vec::new();

    for dir in dirs {
        trace!( ?dir, "scan directory" );

        let Ok( entries ) = std::fs::read_dir( dir ) else {
            trace!( ?dir, "unreadable, skip" );
            continue;
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some( name ) = name.to_str() else { continue };
            if !name.starts_with( partial ) {
                continue;
            }
            if matches!( is_executable( &entry.path() ), Ok( true ) ) {
                trace!( name, "completion match" );
                found.push( name.to_owned() );
            }
        }
    }

    found
}

/// Locate `command` under `dirs`, first match wins. Only
/// executable regular files count, symlinks followed. A command
/// containing a slash is a path already and is returned verbatim,
/// leaving any problem with it to the exec that follows.
#[ tracing::instrument( skip( dirs ) ) ]
pub fn find_command( dirs: &[PathBuf], command: &str ) -> Option<PathBuf> {
    if command.contains( '/' ) {
        debug!( "command names a path, use it verbatim" );
        return Some( PathBuf::from( command ) );
    }

    for dir in dirs {
        let candidate = dir.join( command );
        trace!( ?candidate );
        if matches!( is_executable( &candidate ), Ok( true ) ) {
            debug!( ?candidate, "found" );
            return Some( candidate );
        }
    }

    None
}

#[ cfg( test ) ]
#[ allow( clippy::unwrap_used ) ]
mod test {

    use std::fs::Permissions;
    use std::fs::set_permissions;
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    use assert_fs::TempDir;
    use assert_fs::fixture::ChildPath;
    use assert_fs::prelude::*;

    fn install_tool( dir: &ChildPath, name: &str ) {
        let file = dir.child( name );
        file.write_str( "#!/bin/sh\nexit 0\n" ).unwrap();
        set_permissions( file.path(), Permissions::from_mode( 0o755 ) )
            .unwrap();
    }

    fn install_plain_file( dir: &ChildPath, name: &str ) {
        dir.child( name ).write_str( "not a tool" ).unwrap();
    }

    fn bin_dir( top: &TempDir, name: &str ) -> ChildPath {
        let child = top.child( name );
        child.create_dir_all().unwrap();
        child
    }

    #[ test ]
    fn completion_matches_prefix_of_executables_only() {
        let top = TempDir::new().unwrap();
        let bin = bin_dir( &top, "bin" );

        install_tool( &bin, "lorem" );
        install_tool( &bin, "lopsum" );
        install_tool( &bin, "cat" );
        install_plain_file( &bin, "lonot" );

        let dirs = vec![ bin.path().to_owned() ];
        let mut found = complete_command( &dirs, "lo" );
        found.sort_unstable();

        assert_eq!( found, [ "lopsum", "lorem" ] );
    }

    #[ test ]
    fn completion_scans_every_directory() {
        let top = TempDir::new().unwrap();
        let one = bin_dir( &top, "one" );
        let two = bin_dir( &top, "two" );

        install_tool( &one, "lorem" );
        install_tool( &two, "lopsum" );

        let dirs = vec![ one.path().to_owned(), two.path().to_owned() ];
        let mut found = complete_command( &dirs, "lo" );
        found.sort_unstable();

        assert_eq!( found, [ "lopsum", "lorem" ] );
    }

    #[ test ]
    fn lookup_takes_the_first_directory_that_has_it() {
        let top = TempDir::new().unwrap();
        let one = bin_dir( &top, "one" );
        let two = bin_dir( &top, "two" );

        install_tool( &one, "tool" );
        install_tool( &two, "tool" );

        let dirs = vec![ one.path().to_owned(), two.path().to_owned() ];
        let found = find_command( &dirs, "tool" ).unwrap();

        assert_eq!( found, one.child( "tool" ).path() );
    }

    #[ test ]
    fn lookup_skips_non_executable_files() {
        let top = TempDir::new().unwrap();
        let one = bin_dir( &top, "one" );
        let two = bin_dir( &top, "two" );

        install_plain_file( &one, "tool" );
        install_tool( &two, "tool" );

        let dirs = vec![ one.path().to_owned(), two.path().to_owned() ];
        let found = find_command( &dirs, "tool" ).unwrap();

        assert_eq!( found, two.child( "tool" ).path() );
    }

    #[ test ]
    fn lookup_misses_with_none() {
        let top = TempDir::new().unwrap();
        let bin = bin_dir( &top, "bin" );
        install_tool( &bin, "tool" );

        let dirs = vec![ bin.path().to_owned() ];
        assert_eq!( find_command( &dirs, "loot" ), None );
    }

    #[ test ]
    fn slashed_command_is_used_verbatim() {
        let dirs = vec![];
        assert_eq! {
            find_command( &dirs, "./somewhere/tool" ),
            Some( PathBuf::from( "./somewhere/tool" ) )
        };
    }
}
