//! Assembling the largest possible search path.
//!
//! The candidate list starts with the inherited search path and
//! is extended with every fixed prefix crossed with every bin
//! directory flavor, then with the same cross under the home
//! directories. Most candidates won't exist on any given system,
//! which is fine: the deduplication pass drops them.

use std::ffi::OsStr;
use std::path::Path;
use std::path::PathBuf;

use itertools::iproduct;
use tracing::debug;
use tracing::trace;

/// Root prefixes crossed with [`BIN_SUFFIXES`]. The empty prefix
/// yields the top level `/bin` family.
const ROOT_PREFIXES: [ &str; 6 ] = [
    "/usr/local",
    "/usr/local/games",
    "/usr",
    "/usr/games",
    "",
    "/games",
];

/// Prefixes joined under each configured home directory.
const HOME_PREFIXES: [ &str; 2 ] = [ ".local", ".local/games" ];

/// The bin directory flavors under every prefix.
const BIN_SUFFIXES: [ &str; 4 ] = [ "bin", "xbin", "sbin", "sxbin" ];

/// Upper bound on the serialized (colon-joined) size of the
/// candidate list.
pub const MAX_UNIFIED_PATH: usize = 4096;

#[ derive( thiserror::Error, Debug ) ]
#[ error( "Candidate search path is {got} bytes, over the {limit} byte limit" ) ]
pub struct OverflowError {
    got: usize,
    limit: usize,
}

/// Build the ordered candidate list from the inherited search
/// path and the two home directories. A home that is not
/// configured contributes nothing.
///
/// Empty segments of the inherited path are kept as empty entries
/// so the later compaction pass sees exactly what was inherited.
///
/// # Errors
///
/// [`OverflowError`] when the serialized list would not fit
/// within [`MAX_UNIFIED_PATH`] bytes. Never truncates silently.
#[ tracing::instrument( skip_all ) ]
pub fn build_candidates(
    inherited: Option<&OsStr>,
    apparent_home: Option<&Path>,
    real_home: Option<&Path>,
) -> Result< Vec<PathBuf>, OverflowError > {

    let mut candidates = Vec::new();

    if let Some( path ) = inherited {
        candidates.extend( std::env::split_paths( path ) );
        trace!( inherited_entries = candidates.len() );
    }

    for ( prefix, suffix ) in iproduct!( ROOT_PREFIXES, BIN_SUFFIXES ) {
        candidates.push( PathBuf::from( format!( "{prefix}/{suffix}" ) ) );
    }

    // The environment and the user database may disagree about
    // the home, e.g. under privilege elevation. Collect the
    // groups of both and let deduplication collapse the overlap.
    for home in [ apparent_home, real_home ].into_iter().flatten() {
        for ( prefix, suffix ) in iproduct!( HOME_PREFIXES, BIN_SUFFIXES ) {
            candidates.push( home.join( prefix ).join( suffix ) );
        }
    }

    let serialized_len = candidates.iter()
        .map( |entry| entry.as_os_str().len() )
        .sum::<usize>()
        + candidates.len().saturating_sub( 1 )
    ;

    debug!( candidates = candidates.len(), serialized_len );

    if serialized_len > MAX_UNIFIED_PATH {
        return Err( OverflowError {
            got: serialized_len,
            limit: MAX_UNIFIED_PATH,
        } );
    }

    Ok( candidates )
}

#[ cfg( test ) ]
#[ allow( clippy::unwrap_used ) ]
mod test {

    use super::*;

    const FIXED_GROUP_LEN: usize = ROOT_PREFIXES.len() * BIN_SUFFIXES.len();
    const HOME_GROUP_LEN: usize = HOME_PREFIXES.len() * BIN_SUFFIXES.len();

    fn paths_of( candidates: &[PathBuf] ) -> Vec<&str> {
        candidates.iter()
            .map( |it| it.to_str().unwrap() )
            .collect()
    }

    #[ test ]
    fn fixed_groups_in_order() {
        let candidates = build_candidates( None, None, None ).unwrap();
        let paths = paths_of( &candidates );

        assert_eq!( candidates.len(), FIXED_GROUP_LEN );
        assert_eq! {
            paths.first().copied(),
            Some( "/usr/local/bin" )
        };
        assert_eq! {
            paths.get( ..4 ).unwrap(),
            [
                "/usr/local/bin",
                "/usr/local/xbin",
                "/usr/local/sbin",
                "/usr/local/sxbin",
            ]
        };
        assert!( paths.contains( &"/bin" ) );
        assert!( paths.contains( &"/sxbin" ) );
        assert_eq!( paths.last().copied(), Some( "/games/sxbin" ) );
    }

    #[ test ]
    fn inherited_path_comes_first() {
        let inherited = OsStr::new( "/alpha:/beta" );
        let candidates =
            build_candidates( Some( inherited ), None, None ).unwrap();
        let paths = paths_of( &candidates );

        assert_eq!( paths.get( ..2 ).unwrap(), [ "/alpha", "/beta" ] );
        assert_eq!( candidates.len(), 2 + FIXED_GROUP_LEN );
    }

    #[ test ]
    fn empty_inherited_segments_are_kept() {
        let inherited = OsStr::new( "/alpha::/beta" );
        let candidates =
            build_candidates( Some( inherited ), None, None ).unwrap();
        let paths = paths_of( &candidates );

        assert_eq!( paths.get( ..3 ).unwrap(), [ "/alpha", "", "/beta" ] );
    }

    #[ test ]
    fn home_groups_follow_fixed_groups() {
        let home = Path::new( "/home/somewhere" );
        let candidates =
            build_candidates( None, Some( home ), None ).unwrap();
        let paths = paths_of( &candidates );

        assert_eq!( candidates.len(), FIXED_GROUP_LEN + HOME_GROUP_LEN );
        assert_eq! {
            paths.get( FIXED_GROUP_LEN ).copied(),
            Some( "/home/somewhere/.local/bin" )
        };
        assert!( paths.contains( &"/home/somewhere/.local/games/sxbin" ) );
    }

    #[ test ]
    fn both_homes_contribute() {
        let apparent = Path::new( "/home/apparent" );
        let real = Path::new( "/root" );
        let candidates =
            build_candidates( None, Some( apparent ), Some( real ) )
                .unwrap();
        let paths = paths_of( &candidates );

        assert_eq! {
            candidates.len(),
            FIXED_GROUP_LEN + 2 * HOME_GROUP_LEN
        };
        assert!( paths.contains( &"/home/apparent/.local/bin" ) );
        assert!( paths.contains( &"/root/.local/bin" ) );
        // apparent home groups come before real home groups
        let apparent_at = paths.iter()
            .position( |it| *it == "/home/apparent/.local/bin" )
            .unwrap();
        let real_at = paths.iter()
            .position( |it| *it == "/root/.local/bin" )
            .unwrap();
        assert!( apparent_at < real_at );
    }

    #[ test ]
    fn absent_homes_leave_no_placeholder() {
        let candidates =
            build_candidates( Some( OsStr::new( "/alpha" ) ), None, None )
                .unwrap();
        for path in paths_of( &candidates ) {
            assert!( !path.contains( ".local" ), "unexpected: {path}" );
            assert!( !path.contains( "%s" ), "unexpected: {path}" );
        }
    }

    #[ test ]
    fn oversized_candidate_list_is_refused() {
        let huge = "/x".repeat( MAX_UNIFIED_PATH );
        let err =
            build_candidates( Some( OsStr::new( &huge ) ), None, None )
                .unwrap_err();
        assert!( err.to_string().contains( "limit" ) );
    }
}
