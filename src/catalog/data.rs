//! Seed product data.

use super::{Category, Product};

pub(super) fn products() -> Vec<Product> {
    vec![
        Product {
            id: "xreal-air-2-pro",
            name: "XREAL Air 2 Pro",
            brand: "XREAL",
            category: Category::Display,
            tagline: "Electrochromic dimming with a 1080p micro-OLED display",
            price_usd: 449,
            rating: 4.5,
            fov_degrees: 46,
            weight_grams: 75,
            released: "2023-11",
            in_stock: true,
        },
        Product {
            id: "xreal-one",
            name: "XREAL One",
            brand: "XREAL",
            category: Category::Display,
            tagline: "Native 3DoF anchoring from the on-board X1 chip",
            price_usd: 499,
            rating: 4.6,
            fov_degrees: 50,
            weight_grams: 84,
            released: "2024-10",
            in_stock: true,
        },
        Product {
            id: "viture-one",
            name: "VITURE One",
            brand: "VITURE",
            category: Category::Display,
            tagline: "Myopia dials and a neckband ecosystem for cloud gaming",
            price_usd: 439,
            rating: 4.3,
            fov_degrees: 43,
            weight_grams: 78,
            released: "2023-04",
            in_stock: true,
        },
        Product {
            id: "rokid-max",
            name: "Rokid Max",
            brand: "Rokid",
            category: Category::Display,
            tagline: "Wide 50 degree field of view for a 215 inch virtual screen",
            price_usd: 399,
            rating: 4.2,
            fov_degrees: 50,
            weight_grams: 75,
            released: "2023-05",
            in_stock: false,
        },
        Product {
            id: "ray-ban-meta",
            name: "Ray-Ban Meta",
            brand: "Meta",
            category: Category::Smart,
            tagline: "Camera glasses with an on-device voice assistant",
            price_usd: 299,
            rating: 4.4,
            fov_degrees: 0,
            weight_grams: 49,
            released: "2023-10",
            in_stock: true,
        },
        Product {
            id: "even-realities-g1",
            name: "Even Realities G1",
            brand: "Even Realities",
            category: Category::Smart,
            tagline: "Discreet heads-up display in everyday prescription frames",
            price_usd: 599,
            rating: 4.1,
            fov_degrees: 25,
            weight_grams: 36,
            released: "2024-11",
            in_stock: true,
        },
        Product {
            id: "magic-leap-2",
            name: "Magic Leap 2",
            brand: "Magic Leap",
            category: Category::Enterprise,
            tagline: "Dynamic dimming and a 70 degree diagonal field of view",
            price_usd: 3299,
            rating: 4.0,
            fov_degrees: 70,
            weight_grams: 260,
            released: "2022-09",
            in_stock: true,
        },
        Product {
            id: "hololens-2",
            name: "HoloLens 2",
            brand: "Microsoft",
            category: Category::Enterprise,
            tagline: "Fully articulated hand tracking for frontline work",
            price_usd: 3500,
            rating: 3.9,
            fov_degrees: 52,
            weight_grams: 566,
            released: "2019-11",
            in_stock: false,
        },
    ]
}
