//! Static category mapping table.

/// Coarse bucket shown to shoppers.
pub(super) struct SlugInfo {
    pub slug: &'static str,
    pub display_name: &'static str,
    pub icon: &'static str,
}

pub(super) const SLUGS: &[SlugInfo] = &[
    SlugInfo { slug: "todos", display_name: "Todos", icon: "🛍️" },
    SlugInfo { slug: "ropa", display_name: "Ropa y accesorios", icon: "👕" },
    SlugInfo { slug: "calzado", display_name: "Calzado", icon: "👟" },
    SlugInfo { slug: "joyeria", display_name: "Joyería", icon: "💍" },
    SlugInfo { slug: "hogar", display_name: "Hogar y deco", icon: "🏠" },
    SlugInfo { slug: "cocina", display_name: "Cocina", icon: "🍳" },
    SlugInfo { slug: "mates", display_name: "Mates y termos", icon: "🧉" },
    SlugInfo { slug: "belleza", display_name: "Belleza", icon: "💄" },
    SlugInfo { slug: "juguetes", display_name: "Juguetes", icon: "🧸" },
    SlugInfo { slug: "arte", display_name: "Arte y manualidades", icon: "🎨" },
    SlugInfo { slug: "otros", display_name: "Otros", icon: "📦" },
];

/// Provider category code -> slug.
pub(super) const CATEGORY_TABLE: &[(&str, &str)] = &[
    // Ropa
    ("MLA1430", "ropa"),
    ("MLA109276", "ropa"),
    ("MLA109282", "ropa"),
    ("MLA414251", "ropa"),
    ("MLA1912", "ropa"),
    // Calzado
    ("MLA109027", "calzado"),
    ("MLA414673", "calzado"),
    ("MLA415192", "calzado"),
    // Joyería
    ("MLA3937", "joyeria"),
    ("MLA1432", "joyeria"),
    ("MLA3943", "joyeria"),
    // Hogar
    ("MLA1574", "hogar"),
    ("MLA436380", "hogar"),
    ("MLA1631", "hogar"),
    ("MLA1582", "hogar"),
    // Cocina
    ("MLA1576", "cocina"),
    ("MLA30834", "cocina"),
    // Mates
    ("MLA1499", "mates"),
    ("MLA371792", "mates"),
    ("MLA411421", "mates"),
    // Belleza
    ("MLA1246", "belleza"),
    ("MLA1253", "belleza"),
    // Juguetes
    ("MLA1132", "juguetes"),
    ("MLA1166", "juguetes"),
    // Arte
    ("MLA1368", "arte"),
    ("MLA2102", "arte"),
    ("MLA3025", "arte"),
];
