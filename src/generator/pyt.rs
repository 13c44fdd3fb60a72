//! ArcGIS Python Toolbox (.pyt) generator.
//!
//! The generated toolbox exposes one tool, `LoadPostGISLayers`, with six
//! parameters (host, port, database, user, hidden password, optional schema
//! filter) prefilled from the resolved connection settings. The password
//! parameter is `GPStringHidden` and never hardcoded; the tool dialog
//! prompts for it.

use chrono::Local;

use crate::config::DbConfig;
use crate::schema::Schema;

pub fn generate_pyt(schema: &Schema, db: &DbConfig) -> String {
    let layers = &schema.layers;
    let n = layers.len();

    let mut lines: Vec<String> = vec![
        "# -*- coding: utf-8 -*-".to_string(),
        r#"""""#.to_string(),
        "Auto-generated ArcGIS Python Toolbox (.pyt)".to_string(),
        format!("Database : {} @ {}:{}", db.dbname, db.host, db.port),
        format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M")),
        format!("Layers   : {n}"),
        String::new(),
        "Open in ArcGIS Pro via Insert > Toolbox > Add Python Toolbox".to_string(),
        r#"""""#.to_string(),
        String::new(),
        "import os".to_string(),
        "import arcpy".to_string(),
        String::new(),
        String::new(),
        "class Toolbox:".to_string(),
        r#"    """PostGIS Layer Loader toolbox.""""#.to_string(),
        String::new(),
        "    def __init__(self):".to_string(),
        r#"        self.label = "PostGIS Loader""#.to_string(),
        r#"        self.alias = "postgis_loader""#.to_string(),
        "        self.tools = [LoadPostGISLayers]".to_string(),
        String::new(),
        String::new(),
        "class LoadPostGISLayers:".to_string(),
        r#"    """Load all PostGIS layers into the current ArcGIS Pro map.""""#.to_string(),
        String::new(),
        "    def __init__(self):".to_string(),
        r#"        self.label = "Load PostGIS Layers""#.to_string(),
        "        self.description = (".to_string(),
        r#"            "Connect to a PostGIS database and add all spatial layers ""#.to_string(),
        r#"            "to the active map.""#.to_string(),
        "        )".to_string(),
        String::new(),
        "    def getParameterInfo(self):".to_string(),
        "        host = arcpy.Parameter(".to_string(),
        r#"            displayName="Host","#.to_string(),
        r#"            name="host","#.to_string(),
        r#"            datatype="GPString","#.to_string(),
        r#"            parameterType="Required","#.to_string(),
        r#"            direction="Input","#.to_string(),
        "        )".to_string(),
        format!(r#"        host.value = "{}""#, db.host),
        String::new(),
        "        port = arcpy.Parameter(".to_string(),
        r#"            displayName="Port","#.to_string(),
        r#"            name="port","#.to_string(),
        r#"            datatype="GPString","#.to_string(),
        r#"            parameterType="Required","#.to_string(),
        r#"            direction="Input","#.to_string(),
        "        )".to_string(),
        format!(r#"        port.value = "{}""#, db.port),
        String::new(),
        "        dbname = arcpy.Parameter(".to_string(),
        r#"            displayName="Database","#.to_string(),
        r#"            name="dbname","#.to_string(),
        r#"            datatype="GPString","#.to_string(),
        r#"            parameterType="Required","#.to_string(),
        r#"            direction="Input","#.to_string(),
        "        )".to_string(),
        format!(r#"        dbname.value = "{}""#, db.dbname),
        String::new(),
        "        user = arcpy.Parameter(".to_string(),
        r#"            displayName="User","#.to_string(),
        r#"            name="user","#.to_string(),
        r#"            datatype="GPString","#.to_string(),
        r#"            parameterType="Required","#.to_string(),
        r#"            direction="Input","#.to_string(),
        "        )".to_string(),
        format!(r#"        user.value = "{}""#, db.user),
        String::new(),
        "        password = arcpy.Parameter(".to_string(),
        r#"            displayName="Password","#.to_string(),
        r#"            name="password","#.to_string(),
        r#"            datatype="GPStringHidden","#.to_string(),
        r#"            parameterType="Required","#.to_string(),
        r#"            direction="Input","#.to_string(),
        "        )".to_string(),
        String::new(),
        "        schema_filter = arcpy.Parameter(".to_string(),
        r#"            displayName="Schema Filter (optional)","#.to_string(),
        r#"            name="schema_filter","#.to_string(),
        r#"            datatype="GPString","#.to_string(),
        r#"            parameterType="Optional","#.to_string(),
        r#"            direction="Input","#.to_string(),
        "        )".to_string(),
        String::new(),
        "        return [host, port, dbname, user, password, schema_filter]".to_string(),
        String::new(),
        "    def isLicensed(self):".to_string(),
        "        return True".to_string(),
        String::new(),
        "    def updateParameters(self, parameters):".to_string(),
        "        pass".to_string(),
        String::new(),
        "    def updateMessages(self, parameters):".to_string(),
        "        pass".to_string(),
        String::new(),
        "    def execute(self, parameters, messages):".to_string(),
        "        host          = parameters[0].valueAsText".to_string(),
        "        port          = parameters[1].valueAsText".to_string(),
        "        dbname        = parameters[2].valueAsText".to_string(),
        "        user          = parameters[3].valueAsText".to_string(),
        "        password      = parameters[4].valueAsText".to_string(),
        "        schema_filter = parameters[5].valueAsText".to_string(),
        String::new(),
        r#"        sde_file = os.path.join(arcpy.env.scratchFolder, "postgis_conn.sde")"#
            .to_string(),
        String::new(),
        "        arcpy.management.CreateDatabaseConnection(".to_string(),
        "            out_folder_path=arcpy.env.scratchFolder,".to_string(),
        r#"            out_name="postgis_conn.sde","#.to_string(),
        r#"            database_platform="POSTGRESQL","#.to_string(),
        "            instance=host,".to_string(),
        r#"            account_authentication="DATABASE_AUTH","#.to_string(),
        "            username=user,".to_string(),
        "            password=password,".to_string(),
        r#"            save_user_pass="SAVE_USERNAME","#.to_string(),
        "            database=dbname,".to_string(),
        "        )".to_string(),
        String::new(),
        r#"        aprx    = arcpy.mp.ArcGISProject("CURRENT")"#.to_string(),
        "        act_map = aprx.activeMap".to_string(),
        String::new(),
        "        _tables = [".to_string(),
    ];

    for layer in layers {
        lines.push(format!(
            r#"            ("{}", "{}"),"#,
            layer.schema, layer.table
        ));
    }

    lines.extend([
        "        ]".to_string(),
        "        for _schema, _table in _tables:".to_string(),
        "            if schema_filter and _schema != schema_filter:".to_string(),
        "                continue".to_string(),
        r#"            _fc = f"{sde_file}\\{dbname}.{_schema}.{_table}""#.to_string(),
        "            act_map.addDataFromPath(_fc)".to_string(),
        r#"            messages.addMessage(f"Added: {_schema}.{_table}")"#.to_string(),
        String::new(),
        r#"        messages.addMessage(f"Done. {len(_tables)} layer(s) processed.")"#.to_string(),
    ]);

    lines.join("\n")
}
