use custom_error::custom_error;

pub type Result<T> = std::result::Result<T, Error>;

custom_error! {pub Error
    Io{source: std::io::Error} = "I/O error",
    Csv{source: csv::Error} = "CSV error",
    Toml{source: toml::de::Error} = "config file error",
    Walk{source: walkdir::Error} = "directory walk error",
    NotYielded = "No item was yielded",
    NoFixes{path: String} = "{path} does not contain IGC data",
    NotIgc{path: String} = "{path} is not an IGC file",
    UnknownField{name: String} = "unknown template field {name}",
    NoFiles = "No IGC files found"
}
