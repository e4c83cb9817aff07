//! CMake target names for well-known ports.
//!
//! Ports whose exported target differs from the port name are listed here;
//! everything else uses the port name as its target.

/// Resolve the CMake target a consumer links against for `package`.
pub fn cmake_target(package: &str) -> String {
    let target = match package {
        "boost" => "Boost::boost",
        "catch2" => "Catch2::Catch2",
        "curl" => "CURL::libcurl",
        "eigen3" => "Eigen3::Eigen",
        "fmt" => "fmt::fmt",
        "glfw3" => "glfw",
        "gtest" => "GTest::gtest",
        "libjpeg-turbo" => "JPEG::JPEG",
        "libpng" => "PNG::PNG",
        "nlohmann-json" => "nlohmann_json::nlohmann_json",
        "openssl" => "OpenSSL::SSL",
        "protobuf" => "protobuf::libprotobuf",
        "sdl2" => "SDL2::SDL2",
        "spdlog" => "spdlog::spdlog",
        "sqlite3" => "unofficial::sqlite3::sqlite3",
        "yaml-cpp" => "yaml-cpp::yaml-cpp",
        "zlib" => "ZLIB::ZLIB",
        "zstd" => "zstd::libzstd",
        other => other,
    };
    target.to_string()
}
