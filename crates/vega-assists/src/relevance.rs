//! Relevance scores. Higher ranks first among proposals of the same kind.

pub const EXTRACT_CONSTANT: i32 = 10;
pub const EXTRACT_FIELD: i32 = 9;
pub const EXTRACT_METHOD: i32 = 8;
pub const EXTRACT_LOCAL_ALL: i32 = 7;
pub const EXTRACT_LOCAL: i32 = 6;

/// Extract relevances when a problem is reported at the selection.
pub const EXTRACT_CONSTANT_ERROR: i32 = 0;
pub const EXTRACT_FIELD_ERROR: i32 = -1;
pub const EXTRACT_METHOD_ERROR: i32 = -2;
pub const EXTRACT_LOCAL_ALL_ERROR: i32 = -3;
pub const EXTRACT_LOCAL_ERROR: i32 = -4;

pub const ASSIGN_PARAM_TO_EXISTING_FIELD: i32 = 9;
pub const ASSIGN_PARAM_TO_NEW_FIELD: i32 = 8;
pub const ASSIGN_ALL_PARAMS_TO_NEW_FIELDS: i32 = 7;

pub const CHANGE_VARIABLE: i32 = 5;
pub const CONVERT_TO_LAMBDA: i32 = 5;
pub const CONVERT_TO_ANONYMOUS: i32 = 4;

pub const REPLACE_CATCH_WITH_THROWS: i32 = 6;
pub const REPLACE_EXCEPTION_WITH_THROWS: i32 = 6;
pub const REMOVE_CATCH: i32 = 5;
pub const REMOVE_EXCEPTION: i32 = 5;

pub const ADD_STATIC_IMPORT: i32 = 1;
