// data module
pub mod data {
    pub mod spectrum;
    pub mod instrument;
}

// optics module
pub mod optics {
    pub mod constants;
    pub mod curves;
    pub mod grid;
}

// algorithm module
pub mod algorithm {
    pub mod composition;
    pub mod noise;
    pub mod peaks;
    pub mod utility;
}
